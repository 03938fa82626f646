use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgGroup, Args};
use console::style;
use dialoguer::Password;
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::config::Config;
use crate::encoding;
use crate::shamir::{self, random, Share};

const PERMISSIONS_WARNING: &str = "Warning: file mode 0600 is POSIX-only and not enforced on this \
platform; ensure directory ACLs are restrictive.";

/// Arguments for `sss split`
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["secret", "input", "prompt"])))]
pub struct SplitArgs {
    /// Number of shares to generate (2..255) [default: from config]
    #[arg(short = 'n', long = "parts")]
    pub shares: Option<usize>,

    /// Threshold required to reconstruct (2..=n) [default: from config]
    #[arg(short = 't', long)]
    pub threshold: Option<usize>,

    /// Secret provided as a UTF-8 string
    #[arg(long)]
    pub secret: Option<String>,

    /// Path to a binary file containing the secret
    #[arg(long = "in", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Read the secret from a hidden prompt
    #[arg(long)]
    pub prompt: bool,

    /// Write shares as Base64 text files (share_01.b64, ...)
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Do not print shares to stdout
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for `sss combine`
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("from").required(true).args(["shares", "files"])))]
pub struct CombineArgs {
    /// Comma-separated Base64 shares
    #[arg(long, value_delimiter = ',', value_name = "B64,B64,...")]
    pub shares: Vec<String>,

    /// Comma-separated files, each containing one Base64 share
    #[arg(long, value_delimiter = ',', value_name = "FILE,FILE,...")]
    pub files: Vec<String>,

    /// Write the recovered secret to this file (recommended for binary secrets)
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

/// Execute the init command
pub fn init() -> Result<()> {
    Config::initialize()?;
    Ok(())
}

/// Execute the split command
pub fn split(config: Config, args: SplitArgs) -> Result<()> {
    let shares_count = args.shares.unwrap_or(config.default_shares);
    let threshold = args.threshold.unwrap_or(config.default_threshold);
    let quiet = args.quiet || config.quiet;
    let outdir = args.outdir.or(config.output_dir);

    if shares_count < threshold
        || shares_count < 2
        || threshold < 2
        || shares_count > shamir::MAX_SHARES
    {
        bail!("invalid -n / -t values: require 2 <= t <= n <= 255");
    }

    let secret = read_secret(
        args.secret.map(Zeroizing::new),
        args.input.as_deref(),
        args.prompt,
    )?;
    if secret.is_empty() {
        bail!("secret is empty");
    }

    let shares = shamir::split(&secret, shares_count, threshold).context("split failed")?;

    self_test(&shares, threshold, &secret).context("self-test failed")?;
    info!("self-test passed for n={} t={}", shares_count, threshold);

    if !quiet {
        println!("{}", style("Shares (Base64):").bold());
        for (i, share) in shares.iter().enumerate() {
            let encoded = encoding::encode_share(share);
            println!("  [{:02}] {}", i + 1, encoded.as_str());
        }
    }

    if let Some(dir) = outdir {
        write_shares(&dir, &shares)?;
        println!("Wrote {} share files to {}", shares.len(), dir.display());
    }

    let raw_len = shares[0].as_bytes().len();
    println!(
        "{} n={} t={}; share length={} bytes (raw), {} Base64 chars.",
        style("Split OK.").green().bold(),
        shares_count,
        threshold,
        raw_len,
        encoding::encoded_len(raw_len)?
    );
    println!(
        "Self-test: {} (random threshold subset successfully recombined)",
        style("PASS").green()
    );

    Ok(())
}

/// Load the secret from exactly one of its possible sources
fn read_secret(
    text: Option<Zeroizing<String>>,
    input: Option<&Path>,
    prompt: bool,
) -> Result<Zeroizing<Vec<u8>>> {
    match (text, input, prompt) {
        (Some(text), None, false) => Ok(Zeroizing::new(text.as_bytes().to_vec())),
        (None, Some(path), false) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read --in {}", path.display()))?;
            Ok(Zeroizing::new(bytes))
        }
        (None, None, true) => {
            let entered = Zeroizing::new(
                Password::new()
                    .with_prompt("Enter secret")
                    .interact()?,
            );
            Ok(Zeroizing::new(entered.as_bytes().to_vec()))
        }
        _ => bail!("provide exactly one of --secret, --in or --prompt"),
    }
}

/// Recombine a random threshold-sized subset and compare with the original
fn self_test(shares: &[Share], threshold: usize, original: &[u8]) -> Result<()> {
    let mut indices: Vec<usize> = (0..shares.len()).collect();
    random::shuffle(&mut rand::rngs::OsRng, &mut indices)?;

    let subset: Vec<&Share> = indices[..threshold].iter().map(|&i| &shares[i]).collect();
    debug!("self-test combining {} of {} shares", subset.len(), shares.len());

    let recovered = shamir::combine(&subset)?;
    if recovered.as_slice() != original {
        bail!("recombined secret does not match the original");
    }
    Ok(())
}

fn write_shares(dir: &Path, shares: &[Share]) -> Result<()> {
    encoding::create_private_dir(dir)?;
    if !cfg!(unix) {
        eprintln!("{}", style(PERMISSIONS_WARNING).yellow());
    }

    for (i, share) in shares.iter().enumerate() {
        let path = dir.join(format!("share_{:02}.b64", i + 1));
        encoding::write_share_file(&path, share)?;
        debug!("wrote {}", path.display());
    }
    Ok(())
}

/// Execute the combine command
pub fn combine(args: CombineArgs) -> Result<()> {
    let shares = collect_shares(&args)?;
    if shares.len() < 2 {
        bail!("need at least 2 shares to combine");
    }

    let secret = shamir::combine(&shares).context("combine failed")?;

    if let Some(path) = args.out {
        if !cfg!(unix) {
            eprintln!("{}", style(PERMISSIONS_WARNING).yellow());
        }
        encoding::write_private(&path, &secret)
            .with_context(|| format!("failed to write --out {}", path.display()))?;
        println!(
            "Recovered secret written to {} ({} bytes)",
            path.display(),
            secret.len()
        );
        return Ok(());
    }

    if !is_likely_text(&secret) {
        warn!("recovered {} bytes that do not look like text", secret.len());
        eprintln!(
            "{}",
            style("Warning: recovered data looks binary. Use --out to write to a file.").yellow()
        );
    }
    // Raw bytes, not a lossy UTF-8 rendering
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&secret)
        .context("failed to write the recovered secret to stdout")?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}

fn collect_shares(args: &CombineArgs) -> Result<Vec<Share>> {
    if !args.files.is_empty() {
        return share_paths(&args.files)
            .map(encoding::read_share_file)
            .collect();
    }

    args.shares
        .iter()
        .enumerate()
        .map(|(i, text)| {
            encoding::decode_share(text).map_err(|e| anyhow!("share {}: {}", i + 1, e))
        })
        .collect()
}

/// Trimmed, non-empty entries of a comma-separated file list
fn share_paths(entries: &[String]) -> impl Iterator<Item = &Path> {
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(Path::new)
}

/// Printable ASCII plus tab, newline and carriage return
fn is_likely_text(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&c| matches!(c, b'\t' | b'\n' | b'\r') || (32..=126).contains(&c))
}
