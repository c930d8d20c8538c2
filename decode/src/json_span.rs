/// Locates the first complete JSON object in `data`.
///
/// The object starts at the first `{` and ends at the `}` that brings the brace depth back to
/// zero. Braces inside string literals are not counted. Returns `None` when the object never
/// closes.
pub fn find_json_object(data: &[u8]) -> Option<&[u8]> {
    let start = data.iter().position(|&b| b == b'{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in data[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&data[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
