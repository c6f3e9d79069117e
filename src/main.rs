use clap::{Args, Parser, Subcommand};
use derive_more::{Display, Error};
use exn::ResultExt;
use stash_address::{AddressMode, Addresser, HashAlgorithm, shard};
use stash_config::Config;
use stash_manifest::{Manifest, ManifestFormat};
use std::fmt::Display as FmtDisplay;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Result<T> = std::result::Result<T, exn::Exn<ErrorKind>>;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("release failed")]
    Release,
    #[display("could not address {_0}")]
    Address(#[error(not(source))] String),
    #[display("could not read manifest")]
    Manifest,
    #[display("{_0} is not in the manifest")]
    NotInManifest(#[error(not(source))] String),
    #[display("could not serialize configuration")]
    Output,
}

/// Package game asset trees into a sharded, content-addressed store.
#[derive(Parser, Debug)]
#[command(name = "stash", version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short, global = true, env = "STASH_CONFIG")]
    config: Option<PathBuf>,

    /// More logging; repeat for more detail
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the store from the source roots and write the manifest
    Release(ReleaseArgs),
    /// Print the identifier and store path of files (or logical paths)
    Id(IdArgs),
    /// Look up logical paths in a manifest
    Lookup(LookupArgs),
    /// Print the effective configuration
    Config(OverrideArgs),
}

#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Source root; repeat in merge order (later roots win)
    #[arg(long = "source", short = 's', value_name = "DIR")]
    sources: Vec<PathBuf>,
    /// Store root (wiped on every release)
    #[arg(long, short, value_name = "DIR")]
    destination: Option<PathBuf>,
    #[arg(long, value_parser = parse::<AddressMode>)]
    mode: Option<AddressMode>,
    #[arg(long, value_parser = parse::<HashAlgorithm>)]
    algorithm: Option<HashAlgorithm>,
    /// Digest bits kept for identifiers
    #[arg(long)]
    bits: Option<u32>,
    /// File or directory name to skip; repeat for several
    #[arg(long = "exclude", value_name = "NAME")]
    excludes: Vec<String>,
    /// Manifest encoding
    #[arg(long, value_parser = parse::<ManifestFormat>)]
    format: Option<ManifestFormat>,
    /// Hash and copy on a single thread
    #[arg(long)]
    sequential: bool,
}

#[derive(Args, Debug)]
struct ReleaseArgs {
    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args, Debug)]
struct IdArgs {
    /// Hash the arguments as logical paths instead of reading files
    #[arg(long)]
    path: bool,
    #[arg(long, value_parser = parse::<HashAlgorithm>)]
    algorithm: Option<HashAlgorithm>,
    #[arg(long)]
    bits: Option<u32>,
    #[arg(required = true)]
    inputs: Vec<String>,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Manifest file (format detected automatically)
    manifest: PathBuf,
    /// Logical paths to resolve; prints every entry when omitted
    logical: Vec<String>,
}

fn parse<T>(value: &str) -> std::result::Result<T, String>
where
    T: FromStr,
    T::Err: FmtDisplay,
{
    value.parse().map_err(|e: T::Err| e.to_string())
}

impl OverrideArgs {
    fn apply(self, config: &mut Config) {
        if !self.sources.is_empty() {
            config.sources = self.sources;
        }
        if let Some(destination) = self.destination {
            config.destination = destination;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.algorithm.is_some() {
            config.algorithm = self.algorithm;
        }
        if let Some(bits) = self.bits {
            config.bits = bits;
        }
        if !self.excludes.is_empty() {
            config.excludes = self.excludes;
        }
        if let Some(format) = self.format {
            config.manifest.format = format;
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Release(args) => {
            let config = load(cli.config, args.overrides)?;
            let release = stash_release::release(&config).or_raise(|| ErrorKind::Release)?;
            let stats = release.stats;
            println!(
                "{} files, {} objects ({} duplicates, {} overridden), {} bytes -> {}",
                stats.files,
                stats.objects,
                stats.duplicates,
                stats.overridden,
                stats.bytes,
                config.manifest_path().display()
            );
        },
        Command::Id(args) => {
            let mut config = load(cli.config, OverrideArgs::default())?;
            if args.path {
                config.mode = AddressMode::Path;
                config.algorithm = None;
            }
            config.algorithm = args.algorithm.or(config.algorithm);
            config.bits = args.bits.unwrap_or(config.bits);
            let addresser =
                Addresser::new(config.algorithm(), config.bits).or_raise(|| ErrorKind::Address("input".to_string()))?;
            for input in &args.inputs {
                let address = match config.mode {
                    AddressMode::Path => addresser.address_path(input),
                    AddressMode::Content => {
                        addresser.address_file(input).or_raise(|| ErrorKind::Address(input.clone()))?
                    },
                };
                let store_path = shard::store_path(&address.id).or_raise(|| ErrorKind::Address(input.clone()))?;
                println!("{store_path}\t{input}");
            }
        },
        Command::Lookup(args) => {
            let manifest = Manifest::read(&args.manifest).or_raise(|| ErrorKind::Manifest)?;
            if args.logical.is_empty() {
                for (logical, store_path) in &manifest.filenames {
                    println!("{store_path}\t{logical}");
                }
            }
            for logical in &args.logical {
                match manifest.resolve(logical) {
                    Some(store_path) => println!("{store_path}\t{logical}"),
                    None => exn::bail!(ErrorKind::NotInManifest(logical.clone())),
                }
            }
        },
        Command::Config(overrides) => {
            let config = load(cli.config, overrides)?;
            let json = serde_json::to_string_pretty(&config).or_raise(|| ErrorKind::Output)?;
            println!("{json}");
        },
    }
    Ok(())
}

fn load(path: Option<PathBuf>, overrides: OverrideArgs) -> Result<Config> {
    let mut config = Config::load(path.as_deref()).or_raise(|| ErrorKind::Config)?;
    overrides.apply(&mut config);
    config.validate().or_raise(|| ErrorKind::Config)?;
    tracing::debug!(?config, "Effective configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["stash", "release", "-s", "a", "-s", "b", "--bits", "80", "--format", "json"])]
    #[case(&["stash", "-vv", "release", "--algorithm", "sha-256", "--mode", "path", "--sequential"])]
    fn test_release_overrides(#[case] argv: &[&str]) {
        let cli = Cli::try_parse_from(argv).unwrap();
        let Command::Release(args) = cli.command else {
            panic!("expected release");
        };
        let mut config = Config::default();
        args.overrides.apply(&mut config);
        config.validate().unwrap();
    }

    #[test]
    fn test_overrides_replace_config() {
        let cli = Cli::try_parse_from(["stash", "config", "-s", "a", "-s", "b", "--exclude", "Thumbs.db", "--sequential"])
            .unwrap();
        let Command::Config(overrides) = cli.command else {
            panic!("expected config");
        };
        let mut config = Config::default();
        overrides.apply(&mut config);
        assert_eq!(config.sources, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(config.excludes, vec!["Thumbs.db"]);
        assert!(!config.parallel);
        assert_eq!(config.bits, 64);
    }

    #[rstest]
    #[case(&["stash", "config", "--bits", "40"])]
    #[case(&["stash", "release", "--algorithm", "xxh3", "--bits", "256"])]
    fn test_overrides_fail_validation(#[case] argv: &[&str]) {
        let cli = Cli::try_parse_from(argv).unwrap();
        let overrides = match cli.command {
            Command::Config(overrides) => overrides,
            Command::Release(args) => args.overrides,
            _ => panic!("expected release or config"),
        };
        let mut config = Config::default();
        overrides.apply(&mut config);
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case(&["stash", "release", "--algorithm", "md5"])]
    #[case(&["stash", "release", "--format", "yaml"])]
    #[case(&["stash", "id"])]
    #[case(&["stash", "-q", "-v", "config"])]
    fn test_rejects(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
