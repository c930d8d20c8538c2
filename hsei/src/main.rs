use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{MetadataRecord, StreamUuid, X264_UUID};
use decode::{H264File, SeiOutcome, SeiReport};
use inject::{AccessUnit, BufferTiming, InjectionMode, InjectorConfig, SeiInjector, SlotRead};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Embed detection metadata in H.264 SEI messages and read it back")]
struct Args {
    /// Log every injection decision (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prepend an SEI unit carrying metadata to the access units of an Annex-B file
    Inject {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// One JSON metadata document per line; line N is offered to access unit N
        #[arg(short, long)]
        metadata: PathBuf,

        #[arg(long, default_value_t = StreamUuid::DEFAULT)]
        uuid: StreamUuid,

        /// `always` or `idr`
        #[arg(long, default_value_t = InjectionMode::IdrGated)]
        mode: InjectionMode,

        /// Send each document at most once instead of repeating the latest one
        #[arg(long)]
        take: bool,
    },

    /// Print the detections carried in an Annex-B file
    Extract {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value_t = StreamUuid::DEFAULT)]
        uuid: StreamUuid,
    },

    /// List every SEI message of an Annex-B file and what it holds
    Scan {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value_t = StreamUuid::DEFAULT)]
        uuid: StreamUuid,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_records(reader: impl BufRead) -> Result<Vec<MetadataRecord>> {
    let mut records = vec![];

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line)
            .with_context(|| format!("metadata line {} is not a metadata document", index + 1))?;
        records.push(record);
    }

    Ok(records)
}

fn run_inject(
    input: PathBuf,
    output: PathBuf,
    metadata: PathBuf,
    config: InjectorConfig,
) -> Result<()> {
    let records = read_records(BufReader::new(
        File::open(&metadata).with_context(|| format!("opening {}", metadata.display()))?,
    ))?;
    let h264 = H264File::from_file_path(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let mut out = BufWriter::new(
        File::create(&output).with_context(|| format!("creating {}", output.display()))?,
    );

    let injector = SeiInjector::with_config(config);
    let mut records = records.into_iter();
    let mut units = 0u64;

    for (index, data) in h264.access_units().enumerate() {
        // stands in for the inference loop: one fresh document per frame while they last
        if let Some(record) = records.next() {
            injector.set_latest(record);
        }

        let timing = BufferTiming {
            offset: Some(index as u64),
            ..BufferTiming::default()
        };
        let fused = injector.fuse(&AccessUnit::new(data.to_vec(), timing))?;
        out.write_all(&fused.data)?;
        units += 1;
    }
    out.flush()?;

    info!(
        access_units = units,
        injected = injector.injected_count(),
        output = %output.display(),
        "injection complete"
    );
    Ok(())
}

fn run_extract(input: PathBuf, uuid: StreamUuid) -> Result<()> {
    let h264 =
        H264File::from_file_path(&input).with_context(|| format!("reading {}", input.display()))?;

    let mut found = 0usize;
    for record in h264.metadata(uuid) {
        found += 1;
        if record.detections.is_empty() {
            continue;
        }

        println!(
            "[frame {}] {} detections:",
            record.frame_id,
            record.detections.len()
        );
        for detection in &record.detections {
            println!(
                "  - {} {:.2} {:?}",
                detection.name, detection.confidence, detection.bbox
            );
        }
    }

    info!(records = found, "extraction complete");
    Ok(())
}

fn describe(report: &SeiReport, expected: &StreamUuid) -> String {
    let source = match report.uuid {
        Some(uuid) if uuid == *expected => "ours".to_string(),
        Some(uuid) if uuid == X264_UUID => "x264".to_string(),
        Some(uuid) => uuid.to_string(),
        None => "-".to_string(),
    };

    let outcome = match &report.outcome {
        SeiOutcome::Matched(record) => format!("frame {}", record.frame_id),
        SeiOutcome::NotUserData => "not user data".to_string(),
        SeiOutcome::Truncated => "truncated".to_string(),
        SeiOutcome::ForeignUuid => "foreign".to_string(),
        SeiOutcome::NoJsonObject => "no JSON object".to_string(),
        SeiOutcome::InvalidJson(e) => format!("invalid JSON: {e}"),
    };

    format!(
        "@{:<10} type {:<3} size {:<6} {:<8} {}",
        report.nal_offset, report.payload_type, report.payload_size, source, outcome
    )
}

fn run_scan(input: PathBuf, uuid: StreamUuid) -> Result<()> {
    let h264 =
        H264File::from_file_path(&input).with_context(|| format!("reading {}", input.display()))?;
    let reports = h264.inspect(uuid);

    for report in &reports {
        println!("{}", describe(report, &uuid));
    }

    let x264 = reports.iter().filter(|r| r.uuid == Some(X264_UUID)).count();
    let ours = reports.iter().filter(|r| r.uuid == Some(uuid)).count();
    let matched = reports.iter().filter(|r| r.is_match()).count();

    println!(
        "{} SEI messages: {} from x264, {} with {}, {} decoded",
        reports.len(),
        x264,
        ours,
        uuid,
        matched
    );
    Ok(())
}

fn main() -> Result<()> {
    let Args { verbose, command } = Args::parse();
    init_tracing(verbose);

    match command {
        Command::Inject {
            input,
            output,
            metadata,
            uuid,
            mode,
            take,
        } => {
            let slot_read = if take { SlotRead::Take } else { SlotRead::Keep };
            let config = InjectorConfig::default()
                .with_uuid(uuid)
                .with_mode(mode)
                .with_slot_read(slot_read)
                .with_verbose(verbose);
            run_inject(input, output, metadata, config)
        }
        Command::Extract { input, uuid } => run_extract(input, uuid),
        Command::Scan { input, uuid } => run_scan(input, uuid),
    }
}

#[cfg(test)]
mod tests {
    use common::build_sei_nal;
    use decode::inspect_sei;

    use super::*;

    #[test]
    fn test_read_records() -> Result<()> {
        let lines = concat!(
            r#"{"v":1,"ts_ns":10,"frame":0,"yolo":[]}"#,
            "\n\n",
            r#"{"frame":1,"yolo":[{"cls":0,"name":"person","conf":0.9,"xyxy":[1,2,3,4]}]}"#,
            "\n"
        );

        let records = read_records(lines.as_bytes())?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].detections[0].name, "person");

        assert!(read_records("{\"frame\":\n".as_bytes()).is_err());
        Ok(())
    }

    #[test]
    fn test_describe() {
        let mut data = build_sei_nal(&X264_UUID, b"x264 - core 164");
        data.extend_from_slice(&build_sei_nal(&StreamUuid::DEFAULT, br#"{"frame":12}"#));

        let lines: Vec<_> = inspect_sei(&data, StreamUuid::DEFAULT)
            .iter()
            .map(|r| describe(r, &StreamUuid::DEFAULT))
            .collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("x264") && lines[0].ends_with("foreign"));
        assert!(lines[1].contains("ours") && lines[1].ends_with("frame 12"));
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "hsei", "inject", "-i", "in.h264", "-o", "out.h264", "-m", "meta.jsonl", "--mode",
            "always", "--uuid", "6c4b8b0443c341a293b73a7b70f7ef00",
        ])
        .unwrap();

        match args.command {
            Command::Inject { mode, uuid, take, .. } => {
                assert_eq!(mode, InjectionMode::Always);
                assert_eq!(uuid, StreamUuid::DEFAULT);
                assert!(!take);
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Args::try_parse_from(["hsei", "extract", "-i", "a.h264", "--uuid", "nope"]).is_err());
    }
}
