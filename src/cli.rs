// Command-line front end for chunkzip.
//
// Each invocation handles one chunk: the whole input is read into memory,
// passed through one codec call, and written out. Chunk framing (recording
// the decompressed size, splitting large files) is left to the caller, so
// `decompress` needs the expected size on the command line.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::bound::{self, BLOCK_ALIGNMENT_PAD, SIZE_UNBOUNDED};
use crate::codec::ZipCodec;
use crate::engine::gdeflate::GDEFLATE_PAGE_SIZE;
use crate::level::{self, DEFAULT_ZIP_LEVEL, MAX_ZIP_LEVEL, ProcessDefault};

const BUF_SIZE: usize = 64 * 1024;

/// Largest chunk the CLI will allocate for, compressed or not.
const MAX_CHUNK_SIZE: u64 = 4 * 1024 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Bounded zlib / page-split deflate chunk compressor.
#[derive(Parser, Debug)]
#[command(
    name = "chunkzip",
    version,
    about = "Bounded zlib and page-split deflate chunk compressor",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,

    /// Process-wide default level used when --level is negative.
    #[arg(
        long = "default-level",
        global = true,
        env = "CHUNKZIP_DEFAULT_LEVEL",
        value_parser = clap::value_parser!(i32).range(0..=MAX_ZIP_LEVEL as i64)
    )]
    default_level: Option<i32>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress one chunk.
    Compress(CompressArgs),
    /// Decompress one chunk.
    Decompress(DecompressArgs),
    /// Print the worst-case compressed size for an input size.
    Bound(BoundArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodecArg {
    /// Single zlib stream.
    Zlib,
    /// Page-split deflate.
    Gdeflate,
}

impl CodecArg {
    fn name(self) -> &'static str {
        match self {
            Self::Zlib => "zlib",
            Self::Gdeflate => "gdeflate",
        }
    }
}

#[derive(Args, Debug)]
struct CompressArgs {
    /// Compression level (0-9, or -1 for the configured default).
    #[arg(
        long,
        short = 'l',
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-1..=MAX_ZIP_LEVEL as i64),
        default_value_t = -1
    )]
    level: i32,

    /// Codec to compress with.
    #[arg(long, value_enum, default_value_t = CodecArg::Zlib)]
    codec: CodecArg,

    /// Page count hint for the gdeflate codec (0 lets the engine choose).
    #[arg(long, default_value_t = 0)]
    pages: usize,

    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    /// Decompressed size in bytes (supports K/M/G suffix).
    #[arg(long, short = 's', value_parser = parse_byte_size)]
    size: u64,

    /// Codec the chunk was compressed with.
    #[arg(long, value_enum, default_value_t = CodecArg::Zlib)]
    codec: CodecArg,

    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BoundArgs {
    /// Uncompressed size in bytes (supports K/M/G suffix).
    #[arg(value_parser = parse_byte_size)]
    size: u64,

    /// Page count hint for the gdeflate bound (0 lets the engine choose).
    #[arg(long, default_value_t = 0)]
    pages: usize,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Bound,
    Config,
}

struct Options {
    command: Command,
    codec: CodecArg,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    level: i32,
    default_level: Option<i32>,
    pages: usize,
    size: Option<u64>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        codec: CodecArg::Zlib,
        use_stdout: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        level: -1,
        default_level: cli.default_level,
        pages: 0,
        size: None,
        input_file: None,
        output_file: None,
    };

    match cli.command {
        Cmd::Compress(args) => {
            opts.command = Command::Compress;
            opts.codec = args.codec;
            opts.level = args.level;
            opts.pages = args.pages;
            opts.use_stdout = args.stdout;
            opts.input_file = args.input.or(args.input_pos);
            opts.output_file = args.output.or(args.output_pos);
        }
        Cmd::Decompress(args) => {
            opts.command = Command::Decompress;
            opts.codec = args.codec;
            opts.size = Some(args.size);
            opts.use_stdout = args.stdout;
            opts.input_file = args.input.or(args.input_pos);
            opts.output_file = args.output.or(args.output_pos);
        }
        Cmd::Bound(args) => {
            opts.command = Command::Bound;
            opts.size = Some(args.size);
            opts.pages = args.pages;
        }
        Cmd::Config => {}
    }
    opts
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("chunkzip".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(opts: &Options) -> Result<Vec<u8>, String> {
    let mut data = Vec::new();
    let result = match &opts.input_file {
        Some(path) => File::open(path)
            .and_then(|f| BufReader::with_capacity(BUF_SIZE, f).read_to_end(&mut data))
            .map_err(|e| format!("input file: {}: {e}", path.display())),
        None => io::stdin()
            .lock()
            .read_to_end(&mut data)
            .map_err(|e| format!("stdin: {e}")),
    };
    result.map(|_| data)
}

fn write_output(opts: &Options, data: &[u8]) -> Result<(), String> {
    let mut writer: Box<dyn Write> = match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock())),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            let file =
                File::create(path).map_err(|e| format!("output file: {}: {e}", path.display()))?;
            Box::new(BufWriter::with_capacity(BUF_SIZE, file))
        }
    };
    writer
        .write_all(data)
        .and_then(|_| writer.flush())
        .map_err(|e| format!("write error: {e}"))
}

/// Allocate a zeroed buffer for one chunk, refusing sizes past
/// `MAX_CHUNK_SIZE` and allocation failures instead of aborting.
fn alloc_buffer(len: usize) -> Result<Vec<u8>, String> {
    if len as u64 > MAX_CHUNK_SIZE {
        return Err(format!(
            "buffer of {len} bytes exceeds the {MAX_CHUNK_SIZE} byte chunk limit"
        ));
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| format!("cannot allocate {len} bytes: {e}"))?;
    buf.resize(len, 0);
    Ok(buf)
}

fn print_json(json: &serde_json::Value) {
    match serde_json::to_string_pretty(json) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("chunkzip: json: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("chunkzip version {version} (Rust)");

    let configured = level::default_level()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unset".to_string());
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("DEFAULT_ZIP_LEVEL={DEFAULT_ZIP_LEVEL}");
    eprintln!("CONFIGURED_DEFAULT_LEVEL={configured}");
    eprintln!("MAX_ZIP_LEVEL={MAX_ZIP_LEVEL}");
    eprintln!("GDEFLATE_PAGE_SIZE={GDEFLATE_PAGE_SIZE}");
    eprintln!("BLOCK_ALIGNMENT_PAD={BLOCK_ALIGNMENT_PAD}");
    eprintln!("SIZE_UNBOUNDED={SIZE_UNBOUNDED}");
    eprintln!("MAX_CHUNK_SIZE={MAX_CHUNK_SIZE}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Bound command
// ---------------------------------------------------------------------------

fn cmd_bound(opts: &Options) -> i32 {
    let Some(size) = opts.size.and_then(|s| usize::try_from(s).ok()) else {
        eprintln!("chunkzip: bound: size does not fit in usize");
        return 1;
    };

    let zlib = bound::max_compressed_size(size);
    let paged = bound::max_gdeflate_compressed_size(size, opts.pages);

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "bound",
            "input_size": size,
            "zlib": zlib,
            "zlib_unbounded": bound::is_unbounded(zlib),
            "gdeflate": paged.max_size,
            "gdeflate_unbounded": paged.is_unbounded(),
            "page_count": paged.page_count,
            "page_size": paged.page_size,
        }));
    }
    if !opts.quiet {
        println!("zlib: {zlib}");
        println!(
            "gdeflate: {} ({} pages of {})",
            paged.max_size, paged.page_count, paged.page_size
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Compress command
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> i32 {
    let input = match read_input(opts) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("chunkzip: {e}");
            return 1;
        }
    };

    let codec = ZipCodec::new();
    let level = level::resolve_level(opts.level, &ProcessDefault);
    let (capacity, geometry) = match opts.codec {
        CodecArg::Zlib => (codec.max_compressed_size(input.len()), None),
        CodecArg::Gdeflate => {
            let b = codec.max_gdeflate_compressed_size(input.len(), opts.pages);
            (b.max_size, Some(b))
        }
    };
    if bound::is_unbounded(capacity) {
        eprintln!(
            "chunkzip: compress: input of {} bytes cannot be bounded",
            input.len()
        );
        return 1;
    }

    let mut output = match alloc_buffer(capacity) {
        Ok(buf) => buf,
        Err(e) => {
            eprintln!("chunkzip: compress: {e}");
            return 1;
        }
    };
    let result = match geometry {
        None => codec
            .compress(opts.level, &input, &mut output)
            .map(|len| (len, Vec::new())),
        Some(b) => codec
            .compress_paged_layout(opts.level, &input, &mut output, b.page_count, b.page_size)
            .map(|layout| (layout.len, layout.page_lens)),
    };
    let (len, page_lens) = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("chunkzip: compress: {e}");
            return 1;
        }
    };

    if let Err(e) = write_output(opts, &output[..len]) {
        eprintln!("chunkzip: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "chunkzip: compress: {} level {level}: {} -> {len} bytes (bound {capacity})",
            opts.codec.name(),
            input.len()
        );
    }
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "compress",
            "codec": opts.codec.name(),
            "level": level,
            "input_size": input.len(),
            "output_size": len,
            "bound": capacity,
            "page_sizes": page_lens,
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Decompress command
// ---------------------------------------------------------------------------

fn cmd_decompress(opts: &Options) -> i32 {
    let Some(size) = opts.size.and_then(|s| usize::try_from(s).ok()) else {
        eprintln!("chunkzip: decompress: size does not fit in usize");
        return 1;
    };
    let mut output = match alloc_buffer(size) {
        Ok(buf) => buf,
        Err(e) => {
            eprintln!("chunkzip: decompress: {e}");
            return 1;
        }
    };
    let input = match read_input(opts) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("chunkzip: {e}");
            return 1;
        }
    };

    let codec = ZipCodec::new();
    let result = match opts.codec {
        CodecArg::Zlib => codec.decompress(&input, &mut output),
        CodecArg::Gdeflate => codec.decompress_paged(&input, &mut output),
    };
    let len = match result {
        Ok(len) => len,
        Err(e) => {
            eprintln!("chunkzip: decompress: {e}");
            return 1;
        }
    };

    if let Err(e) = write_output(opts, &output[..len]) {
        eprintln!("chunkzip: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "chunkzip: decompress: {}: {} -> {len} bytes",
            opts.codec.name(),
            input.len()
        );
    }
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "decompress",
            "codec": opts.codec.name(),
            "input_size": input.len(),
            "output_size": len,
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Some(level) = opts.default_level {
        level::set_default_level(level);
    }

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Bound => cmd_bound(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
