use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use photo_organizer_core::{
    ensure_directory, fit_to_box, load_config, run_directory, BatchReport, FsProbe, MarkOutcome,
    ReviewSession, RunOptions, CANVAS_DIM, THUMBNAIL_STRIP,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "photo-organizer", version)]
#[command(about = "写真・動画のファイル名を撮影日時ベースの名前に揃えます")]
struct Cli {
    /// デバッグログを表示する
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Fix(FixArgs),
    Review(ReviewArgs),
}

#[derive(Debug, Args)]
struct FixArgs {
    /// 処理対象のフォルダ
    path: PathBuf,
    /// 実ファイルを変更せずに処理内容だけ表示する
    #[arg(long, alias = "dry-run", default_value_t = false)]
    dummy_run: bool,
    /// 正規名のファイルのアクセス/更新時刻をファイル名の日時に合わせる
    #[arg(long, default_value_t = false)]
    fix_timestamps: bool,
    /// リネームを行わない (--fix-timestamps と併用)
    #[arg(long, default_value_t = false)]
    skip_rename: bool,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Args)]
struct ReviewArgs {
    source: PathBuf,
    #[arg(long)]
    destination: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Fix(args) => cmd_fix(args),
        Commands::Review(args) => cmd_review(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn cmd_fix(args: FixArgs) -> Result<()> {
    if args.skip_rename && !args.fix_timestamps {
        bail!("--skip-rename を使う場合は --fix-timestamps を指定してください。");
    }
    ensure_directory(&args.path)?;

    let options = RunOptions {
        rename: !args.skip_rename,
        fix_timestamps: args.fix_timestamps,
        dry_run: args.dummy_run,
        config: load_config(args.config.as_deref())?,
    };

    let report = run_directory(&args.path, &options, &FsProbe)?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_table(&report);
        }
    }

    if args.dummy_run {
        eprintln!("dry-runモード: 実ファイルは変更していません。");
    }
    Ok(())
}

fn print_table(report: &BatchReport) {
    for failure in &report.failures {
        println!("失敗: {} ({:?}) {}", failure.name, failure.kind, failure.reason);
    }
    println!(
        "\n集計: total={} renamed={} timestamps_fixed={} skipped={} failed={}",
        report.total,
        report.renamed,
        report.timestamps_fixed,
        report.skipped,
        report.failures.len()
    );
}

fn cmd_review(args: ReviewArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut session = ReviewSession::open(&args.source, args.destination.as_deref(), &config)?;
    if session.advance().is_none() {
        println!("対象の画像がありません: {}", args.source.display());
        return Ok(());
    }

    let help = if session.destination().is_some() {
        "n:次へ p:前へ c:コピー a/b:マーク m <文字>:任意のマーク q:終了"
    } else {
        "n:次へ p:前へ a/b:マーク m <文字>:任意のマーク q:終了"
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        show_current(&mut session);
        print!("{help}\n> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut words = line.split_whitespace();
        let result = match (words.next(), words.next()) {
            (Some("q"), _) => break,
            (Some("n"), _) | (None, _) => {
                session.advance();
                Ok(())
            }
            (Some("p"), _) => {
                session.retreat();
                Ok(())
            }
            (Some("c"), _) if session.destination().is_some() => {
                session.mark(None).map(report_mark)
            }
            (Some("a"), _) => session.mark(Some('a')).map(report_mark),
            (Some("b"), _) => session.mark(Some('b')).map(report_mark),
            (Some("m"), Some(mark)) if mark.chars().count() == 1 => {
                session.mark(mark.chars().next()).map(report_mark)
            }
            (Some(other), _) => {
                println!("不明なコマンドです: {other}");
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!("{err:#}");
        }
    }
    Ok(())
}

fn report_mark(outcome: MarkOutcome) {
    match outcome {
        MarkOutcome::Unchanged => {}
        MarkOutcome::Renamed(path) => println!("リネームしました: {}", path.display()),
        MarkOutcome::Copied(path) => println!("コピーしました: {}", path.display()),
    }
}

fn show_current(session: &mut ReviewSession) {
    let Some((index, item)) = session
        .current_index()
        .zip(session.current().cloned())
    else {
        return;
    };

    println!();
    println!("[{}/{}] {}", index + 1, session.items().len(), item.name());
    if !item.status.is_empty() {
        println!("  {}", item.status);
    }
    match fit_to_box(&item.path, CANVAS_DIM) {
        Ok(preview) => println!("  preview {}x{}", preview.width(), preview.height()),
        Err(err) => warn!("{err:#}"),
    }

    for idx in session.thumbnail_window(THUMBNAIL_STRIP) {
        let name = session.items()[idx].name();
        let selected = if idx == index { "<<<" } else { "   " };
        match session.thumbnail(idx) {
            Ok(thumb) => println!(
                "  {selected} {name} ({}x{})",
                thumb.width(),
                thumb.height()
            ),
            Err(err) => {
                println!("  {selected} {name}");
                warn!("{err:#}");
            }
        }
    }
}
