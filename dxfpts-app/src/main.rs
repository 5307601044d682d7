use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dxfpts_config::{AppConfig, ConfigError};
use dxfpts_core::diagnostics::{Diagnostic, Severity};
use dxfpts_engine::{DedupMode, PointSummary, extract};
use dxfpts_io::{DrawingLoader, DxfPointReader, PointCsvWriter, output_path};

/// 从 DXF 文件提取 POINT 坐标（含块参照展开），写出为 CSV。
#[derive(Debug, Parser)]
#[command(name = "dxfpts", version)]
struct Cli {
    /// 输入的 DXF 文件
    input: PathBuf,

    /// 输出 CSV 路径，默认与输入文件同名
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 只保留首次出现的坐标，并在输出文件名中追加去重后缀
    #[arg(short, long)]
    unique: bool,

    /// 额外打印点数、坐标范围与前几个点
    #[arg(long)]
    summary: bool,

    /// 配置文件路径
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖配置中的日志等级（EnvFilter 语法）
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.as_deref());
    init_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "提取失败");
            eprintln!("错误: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    info!(input = %cli.input.display(), "开始解析 DXF");
    let (drawing, mut diagnostics) = DxfPointReader::new()
        .load(&cli.input)
        .with_context(|| format!("无法读取 DXF 文件 {}", cli.input.display()))?
        .into_parts();
    info!(
        loose_points = drawing.points.len(),
        blocks = drawing.blocks.len(),
        instances = drawing.instances.len(),
        "扫描完成"
    );

    let mode = DedupMode::from_unique_flag(cli.unique || config.output.unique);
    let (points, resolve_diagnostics) = extract(&drawing, mode).into_parts();
    diagnostics.extend(resolve_diagnostics);
    report_diagnostics(&diagnostics);

    if points.is_empty() {
        println!("未找到任何点数据");
        return Ok(());
    }

    let suffix = match mode {
        DedupMode::UniqueOrdered => Some(config.output.unique_suffix.as_str()),
        DedupMode::KeepAll => None,
    };
    let output = output_path(&cli.input, cli.output.as_deref(), suffix);
    PointCsvWriter::new()
        .with_bom(config.output.write_bom)
        .save(&points, &output)
        .with_context(|| format!("无法写出 CSV 文件 {}", output.display()))?;
    println!("成功提取 {} 个点，已保存到: {}", points.len(), output.display());

    if cli.summary {
        print!(
            "{}",
            PointSummary::from_points(&points, PointSummary::DEFAULT_PREVIEW)
        );
    }
    Ok(())
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    let mut warnings = 0usize;
    for diagnostic in diagnostics {
        match diagnostic.severity() {
            Severity::Warning => {
                warnings += 1;
                warn!(line = diagnostic.line(), "{diagnostic}");
            }
            Severity::Note => debug!(line = diagnostic.line(), "{diagnostic}"),
        }
    }
    if !diagnostics.is_empty() {
        info!(total = diagnostics.len(), warnings, "解析过程中出现可恢复的问题");
    }
}

fn load_configuration(override_path: Option<&Path>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(path).unwrap_or_else(|err| {
            eprintln!("加载指定配置 {} 失败，使用默认配置: {err}", path.display());
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        eprintln!("加载配置 {} 失败，使用内建默认值: {err}", path.display());
                    }
                    ConfigError::Context { .. } => {
                        eprintln!("加载配置失败，使用内建默认值: {err}");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
