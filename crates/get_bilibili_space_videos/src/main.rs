use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use space_core::{
    export_result, scrape_space_blocking, ExportFormat, ScrapeOptions, ScrapeProgress,
    ScrapeResult,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "导出B站UP主的全部投稿视频", long_about = None)]
struct Cli {
    /// UP主mid或空间链接
    creator: String,

    /// 最多抓取的视频数量（默认全部）
    #[arg(long = "max-videos")]
    max_videos: Option<usize>,

    /// 输出格式
    #[arg(short = 'f', long = "format", value_enum, default_value_t = FormatArg::Both)]
    format: FormatArg,

    /// 输出目录
    #[arg(short = 'o', long = "output", default_value = "./output")]
    output: PathBuf,

    /// 两次请求之间的间隔（秒）
    #[arg(long = "delay", default_value_t = 1.0)]
    delay: f64,

    /// 额外生成文本摘要
    #[arg(long = "summary")]
    summary: bool,

    /// 减少输出
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// 请求超时时间（秒）
    #[arg(long = "timeout", default_value_t = 10)]
    timeout: u64,

    /// 附加Cookie
    #[arg(long = "cookie")]
    cookie: Option<String>,

    /// CSV文件编码
    #[arg(short = 'e', long = "encoding", default_value = "utf-8")]
    encoding: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
    Both,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Both => ExportFormat::Both,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    if !cli.delay.is_finite() || cli.delay < 0.0 {
        bail!("delay 必须是非负数");
    }

    if !cli.quiet {
        print_banner(&cli);
    }

    let progress_bar = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress_bar.enable_steady_tick(Duration::from_millis(120));
    progress_bar.set_message("正在获取UP主信息...");
    let spinner = progress_bar.clone();

    let options = ScrapeOptions {
        creator: cli.creator.clone(),
        max_videos: cli.max_videos,
        request_delay: Duration::from_secs_f64(cli.delay),
        timeout_secs: cli.timeout,
        cookie: cli.cookie.clone(),
        progress_callback: Some(Arc::new(move |progress: ScrapeProgress| {
            spinner.set_message(format!(
                "已获取第 {} 页，累计 {} 个视频",
                progress.page, progress.fetched
            ));
        })),
        ..Default::default()
    };

    let result = scrape_space_blocking(options);
    progress_bar.finish_and_clear();
    let result = result.with_context(|| "抓取UP主视频失败，请检查mid后重试")?;

    let written = export_result(
        &result,
        &cli.output,
        cli.format.into(),
        cli.summary,
        &cli.encoding,
    )
    .with_context(|| format!("写入输出目录失败: {}", cli.output.display()))?;

    if !cli.quiet {
        print_summary(&result, &written);
    }
    Ok(())
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_banner(cli: &Cli) {
    println!("{}", style("=== B站UP主视频抓取 ===").cyan().bold());
    println!("目标: {}", cli.creator);
    match cli.max_videos {
        Some(max) => println!("最大视频数: {max}"),
        None => println!("最大视频数: 全部"),
    }
    println!("输出格式: {:?}", cli.format);
    println!("输出目录: {}", cli.output.display());
    println!("请求间隔: {}s", cli.delay);
}

fn print_summary(result: &ScrapeResult, written: &[PathBuf]) {
    println!("\n{}", style("=== 抓取完成 ===").green().bold());
    println!("{} {}", style("UP主：").green().bold(), result.profile.name);
    println!("{} {}", style("视频总数：").green(), result.count);
    if written.is_empty() {
        println!("{}", style("没有生成任何文件。").yellow());
        return;
    }
    println!("{}", style("生成的文件：").dim());
    for path in written {
        println!("  - {}", path.display());
    }
}
