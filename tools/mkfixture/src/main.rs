use clap::Parser;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Write lazy-loader test programs to a directory.
#[derive(Parser, Debug)]
#[command(name = "mkfixture", version, about)]
struct Cli {
    /// Output directory (created if missing).
    #[arg(value_name = "DIR", required_unless_present = "list")]
    out_dir: Option<PathBuf>,

    /// Only write the named scenario (repeatable).
    #[arg(short, long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// List scenarios and exit.
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list {
        for s in mkfixture::scenarios() {
            println!("{:<16} {}", s.name, s.description);
        }
        return ExitCode::SUCCESS;
    }

    let Some(out_dir) = cli.out_dir else {
        return ExitCode::FAILURE;
    };

    match write_all(&out_dir, &cli.only) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn write_all(out_dir: &Path, only: &[String]) -> io::Result<()> {
    if let Some(unknown) = only.iter().find(|name| mkfixture::find(name).is_none()) {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("unknown scenario {unknown:?}"),
        ));
    }

    fs::create_dir_all(out_dir)?;
    for s in mkfixture::scenarios() {
        if !only.is_empty() && !only.iter().any(|name| name == s.name) {
            continue;
        }
        let path = out_dir.join(format!("{}.elf", s.name));
        fs::write(&path, &s.image)?;
        match s.expected {
            Some(e) => println!(
                "{}: returns {}, {} faults, {} allocations, {} bytes fragmentation",
                path.display(),
                e.return_value,
                e.faults,
                e.allocations,
                e.fragmentation_bytes
            ),
            None => println!("{}: must fail with exit status 1", path.display()),
        }
    }
    Ok(())
}
