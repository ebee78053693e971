// ==========================================
// 燃气瓶配送管理系统 - 命令行入口
// ==========================================
// 子命令:
// - summary: 库存与司机往来概览
// - export:  导出账本快照 (JSON)
// - import:  导入账本快照, 覆盖快照中出现的集合
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use gas_cylinder_ledger::app::{get_default_db_path, AppState, DB_PATH_ENV};
use gas_cylinder_ledger::{logging, LedgerSnapshot, APP_NAME, VERSION};

#[derive(Debug, Parser)]
#[clap(about, version, name = "gas-cylinder-ledger")]
struct Cli {
    /// 数据库文件路径
    #[clap(long, env = DB_PATH_ENV)]
    db: Option<String>,

    /// 以 JSON 格式输出日志
    #[clap(long)]
    json_log: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 打印库存与司机往来概览
    Summary,
    /// 导出账本快照
    Export {
        #[clap(long)]
        out: PathBuf,
    },
    /// 导入账本快照
    Import {
        #[clap(long)]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json_log);

    tracing::info!("{} v{}", APP_NAME, VERSION);
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    let mut app = AppState::open(&db_path).with_context(|| format!("无法打开账本: {}", db_path))?;

    match cli.command {
        Command::Summary => {
            let summary = app.ledger.stock_summary();
            println!("{}", serde_json::to_string_pretty(&summary)?);
            for driver in &app.ledger.state().drivers {
                println!(
                    "{}\t欠款={}\t预付={}\t余额={}",
                    driver.name, driver.debt, driver.advances, driver.balance
                );
            }
        }
        Command::Export { out } => {
            let snapshot = app.ledger.export_snapshot()?;
            let text = serde_json::to_string_pretty(&snapshot)?;
            fs::write(&out, text).with_context(|| format!("无法写入 {}", out.display()))?;
            println!("已导出到 {}", out.display());
        }
        Command::Import { file } => {
            let text =
                fs::read_to_string(&file).with_context(|| format!("无法读取 {}", file.display()))?;
            let snapshot: LedgerSnapshot =
                serde_json::from_str(&text).context("快照格式错误")?;
            let replaced = app.ledger.import_snapshot(snapshot)?;
            println!("已导入 {} 个集合", replaced.len());
        }
    }
    Ok(())
}
