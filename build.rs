// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: asset path or game folder
fn path_arg() -> Arg {
    Arg::new("path")
        .required(true)
        .value_name("PATH")
        .help("Path to Fallout4.esm or the game folder")
}

fn build_cli() -> Command {
    Command::new("esmpatch")
        .version(env!("CARGO_PKG_VERSION"))
        .author("esmpatch contributors")
        .about("Convert Fallout4.esm between Next-Gen, Old-Gen and VR versions")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Configuration file (default: <config dir>/esmpatch/config.toml)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .arg(
            Arg::new("log_file")
                .long("log-file")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Also write a timestamped log file to the current directory"),
        )
        .subcommand(
            Command::new("info")
                .about("Show the version of a Fallout4.esm and the available patches")
                .arg(path_arg())
                .arg(
                    Arg::new("digest")
                        .long("digest")
                        .action(ArgAction::SetTrue)
                        .help("Also compute the content digest"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print machine-readable JSON"),
                ),
        )
        .subcommand(
            Command::new("patch")
                .about("Patch Fallout4.esm to another version")
                .arg(path_arg())
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .value_name("ID")
                        .help("Target version (1.10.163, nextgen); optional when only one exists"),
                )
                .arg(
                    Arg::new("overwrite_backup")
                        .long("overwrite-backup")
                        .action(ArgAction::SetTrue)
                        .help("Replace an existing backup without asking"),
                )
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Answer yes to confirmation prompts"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_name("SECS")
                        .help("Minimum timeout for the patch tool, in seconds"),
                ),
        )
        .subcommand(
            Command::new("restore")
                .about("Restore Fallout4.esm from its backup")
                .arg(path_arg()),
        )
        .subcommand(Command::new("detect").about("Search common install folders for Fallout4.esm"))
        .subcommand(
            Command::new("check").about("Check that xdelta3 and all patch files are available"),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("esmpatch.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
