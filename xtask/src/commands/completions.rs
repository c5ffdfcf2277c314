use std::fs;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use clap_complete::{Shell, generate_to};

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Output directory (default: dist/share/completions)
    #[arg(long = "out-dir", default_value = "dist/share/completions")]
    pub out_dir: PathBuf,

    /// Shells to generate for; repeatable (default: every supported shell)
    #[arg(long, value_enum)]
    pub shell: Vec<Shell>,
}

pub fn cmd_completions(args: CompletionsArgs) -> Result<(), String> {
    let out_dir = crate::workspace_root().join(&args.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;

    let shells = if args.shell.is_empty() {
        Shell::value_variants().to_vec()
    } else {
        args.shell
    };

    let mut cmd = verbump::command();
    for shell in shells {
        let path = generate_to(shell, &mut cmd, "verbump", &out_dir)
            .map_err(|e| format!("generate {shell} completions: {e}"))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
