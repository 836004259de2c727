//! # Gautility 命令行入口
//!
//! ## 子命令
//! - `analyze` - 批量解析 Gaussian 输出，状态判定与异构体能量排序
//! - `spectra` - 由 .fchk 轨道能级合成 DOS / PES 谱

use clap::Parser;
use gautility::cli::Cli;
use gautility::{commands, utils};

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
