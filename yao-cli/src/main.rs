//! Command-line front end for the yao garbled circuits engine.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use yao::circuit::Circuit;
use yao::counter::count_gate_functions;
use yao::encoding::{DecodingInfo, EncodingInfo};
use yao::evaluator::{EvaluatedOutputs, evaluate_circuit, evaluate_circuit_verbose};
use yao::garbler::{garble_circuit, garble_circuit_verbose, load_tables};
use yao::keys::WireKey;
use yao::ot::IdealOt;
use yao::parser::parse_circuit;
use yao::protocol::{EvaluatorSession, GarblerSession};
use yao::stream::BufferedLineStream;
use yao::wire_analyzer::analyze_wire_usage;

/// Garble, evaluate and inspect Boolean circuits with Yao's protocol
#[derive(Parser, Debug)]
#[command(name = "yao-cli")]
#[command(about = "Yao garbled circuits: garble, encode, evaluate and decode")]
#[command(version)]
#[command(subcommand_required = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Buffer size for reading (e.g., 64KB, 1MB)
    #[arg(
        short = 'b',
        long = "buffer-size",
        default_value = "64KB",
        global = true,
        help = "Buffer size for circuit file reading (supports KB/MB/GB suffixes)"
    )]
    buffer_size: String,

    /// Show progress bars for garbling and evaluation
    #[arg(long = "progress", global = true)]
    progress: bool,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Count gates per Boolean function
    Count {
        /// Circuit description file
        file: PathBuf,
    },
    /// Analyze wire fan-out and report dead gates and unused inputs
    Analyze {
        /// Circuit description file
        file: PathBuf,
        /// Output file for the binary report (default: <input>.wire_analysis)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Garble a circuit, writing tables, encoding info and decoding info
    Garble {
        /// Circuit description file
        file: PathBuf,
        /// File holding a 32-byte seed; fresh OS randomness is used when absent
        #[arg(short = 's', long = "seed-file")]
        seed_file: Option<PathBuf>,
        /// Output directory (default: directory of the input)
        #[arg(short = 'o', long = "output-dir")]
        output_dir: Option<PathBuf>,
    },
    /// Encode input bits into wire keys
    Encode {
        /// Encoding info written by `garble`
        #[arg(short = 'e', long = "encoding")]
        encoding: PathBuf,
        /// Input bits, e.g. 101
        #[arg(long = "bits")]
        bits: String,
        /// 0-based position of the first encoded input wire
        #[arg(long = "offset", default_value_t = 0)]
        offset: usize,
        /// Output file for the selected keys
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
    /// Evaluate garbled tables on input keys
    Evaluate {
        /// Circuit description file
        file: PathBuf,
        /// Garbled tables written by `garble`
        #[arg(short = 't', long = "tables")]
        tables: PathBuf,
        /// Key files written by `encode`, in input-wire order
        #[arg(short = 'i', long = "inputs", required = true)]
        inputs: Vec<PathBuf>,
        /// Output file for the output keys
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
    /// Decode output keys into bits
    Decode {
        /// Decoding info written by `garble`
        #[arg(short = 'd', long = "decoding")]
        decoding: PathBuf,
        /// Output keys written by `evaluate`
        #[arg(long = "outputs")]
        outputs: PathBuf,
    },
    /// Run both roles locally with an ideal OT and check against plain evaluation
    Run {
        /// Circuit description file
        file: PathBuf,
        /// Garbler input bits (wires 1..=k)
        #[arg(long = "garbler-bits")]
        garbler_bits: String,
        /// Evaluator input bits (wires k+1..=n); random when absent
        #[arg(long = "evaluator-bits")]
        evaluator_bits: Option<String>,
        /// File holding a 32-byte seed for garbling and random choices
        #[arg(short = 's', long = "seed-file")]
        seed_file: Option<PathBuf>,
    },
}

/// Parse buffer size string (e.g., "64KB", "128MB", "1GB") to bytes
fn parse_buffer_size(size_str: &str) -> Result<usize> {
    let size_str = size_str.to_uppercase();

    if let Some(num_str) = size_str.strip_suffix("GB") {
        let num: f64 = num_str.parse()?;
        Ok((num * 1024.0 * 1024.0 * 1024.0) as usize)
    } else if let Some(num_str) = size_str.strip_suffix("MB") {
        let num: f64 = num_str.parse()?;
        Ok((num * 1024.0 * 1024.0) as usize)
    } else if let Some(num_str) = size_str.strip_suffix("KB") {
        let num: f64 = num_str.parse()?;
        Ok((num * 1024.0) as usize)
    } else {
        Ok(size_str.parse()?)
    }
}

/// Parse a bit string such as "1011"; non-binary digits are left for the encoder to reject
fn parse_bits(bits: &str) -> Result<Vec<u8>> {
    bits.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as u8)
                .ok_or_else(|| anyhow!("Invalid bit '{}' in '{}'", c, bits))
        })
        .collect()
}

fn load_circuit(path: &Path, buffer_size: usize) -> Result<Circuit> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut stream = BufferedLineStream::with_buffer_size(file, buffer_size);
    parse_circuit(&mut stream)
}

fn load_seed(path: &Path) -> Result<[u8; 32]> {
    let data = std::fs::read(path)?;
    data.as_slice()
        .try_into()
        .map_err(|_| anyhow!("Seed file must hold exactly 32 bytes, got {}", data.len()))
}

fn make_rng(seed_file: Option<&Path>) -> Result<ChaCha12Rng> {
    match seed_file {
        Some(path) => {
            tracing::warn!(seed_file = %path.display(), "garbling from a fixed seed; never reuse it across runs");
            Ok(ChaCha12Rng::from_seed(load_seed(path)?))
        }
        None => Ok(ChaCha12Rng::from_os_rng()),
    }
}

fn load_keys(path: &Path) -> Result<Vec<WireKey>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn format_bits(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let buffer_size = parse_buffer_size(&args.buffer_size)?;

    match args.command {
        Commands::Count { file } => {
            let file = File::open(&file)?;
            let mut stream = BufferedLineStream::with_buffer_size(file, buffer_size);
            let counts = count_gate_functions(&mut stream)?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        Commands::Analyze { file, output } => {
            let circuit = load_circuit(&file, buffer_size)?;
            let report = analyze_wire_usage(&circuit);

            let output_path = output.unwrap_or_else(|| {
                let mut path = file.clone();
                path.set_extension("wire_analysis");
                path
            });
            report.save_binary(&output_path)?;
            let summary_path = output_path.with_extension("summary.json");
            report.export_summary_json(&summary_path)?;

            println!("Wire analysis saved to: {}", output_path.display());
            println!("Summary saved to: {}", summary_path.display());
            println!("Total wires: {}", report.total_wires);
            println!("Primary inputs: {}", report.primary_inputs);
            println!("Intermediate wires: {}", report.intermediate_wires);
            println!("Primary outputs: {}", report.primary_outputs);
            println!("Unused inputs: {}", report.unused_inputs);
            println!("Dead gates: {}", report.dead_gates);
        }
        Commands::Garble {
            file,
            seed_file,
            output_dir,
        } => {
            let circuit = load_circuit(&file, buffer_size)?;
            let mut rng = make_rng(seed_file.as_deref())?;
            let garbled = if args.progress {
                garble_circuit_verbose(&circuit, &mut rng)?
            } else {
                garble_circuit(&circuit, &mut rng)?
            };

            let dir = output_dir
                .or_else(|| file.parent().map(Path::to_path_buf))
                .unwrap_or_default();
            let stem = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("circuit")
                .to_string();
            let tables_path = dir.join(format!("{stem}.tables"));
            let encoding_path = dir.join(format!("{stem}.encoding.json"));
            let decoding_path = dir.join(format!("{stem}.decoding.json"));
            garbled.save(&tables_path, &encoding_path, &decoding_path)?;

            println!("Garbled tables: {}", tables_path.display());
            println!("Encoding info: {}", encoding_path.display());
            println!("Decoding info: {}", decoding_path.display());
        }
        Commands::Encode {
            encoding,
            bits,
            offset,
            output,
        } => {
            let encoding = EncodingInfo::load_json(&encoding)?;
            let bits = parse_bits(&bits)?;
            let keys = encoding.encode_range(offset..offset + bits.len(), &bits)?;
            std::fs::write(&output, serde_json::to_string_pretty(&keys)?)?;
            println!("Encoded {} input wires to {}", keys.len(), output.display());
        }
        Commands::Evaluate {
            file,
            tables,
            inputs,
            output,
        } => {
            let circuit = load_circuit(&file, buffer_size)?;
            let tables = load_tables(&tables)?;
            let mut input_keys = Vec::new();
            for path in &inputs {
                input_keys.extend(load_keys(path)?);
            }
            let outputs = if args.progress {
                evaluate_circuit_verbose(&circuit, &tables, &input_keys)?
            } else {
                evaluate_circuit(&circuit, &tables, &input_keys)?
            };
            outputs.save_json(&output)?;
            println!("Output keys for {} wires saved to {}", outputs.keys.len(), output.display());
        }
        Commands::Decode { decoding, outputs } => {
            let decoding = DecodingInfo::load_json(&decoding)?;
            let outputs = EvaluatedOutputs::load_json(&outputs)?;
            let bits = decoding.decode_wires(&outputs.wires, &outputs.keys)?;
            println!("{}", format_bits(&bits));
        }
        Commands::Run {
            file,
            garbler_bits,
            evaluator_bits,
            seed_file,
        } => {
            let circuit = load_circuit(&file, buffer_size)?;
            let garbler_bits = parse_bits(&garbler_bits)?;
            let seed = match seed_file.as_deref() {
                Some(path) => load_seed(path)?,
                None => rand::random(),
            };
            let mut rng = ChaCha12Rng::from_seed(seed);
            let mut ot = IdealOt::new();

            let garbler = GarblerSession::new(circuit.clone(), garbler_bits.len(), &mut rng)?;
            let garbler_keys = garbler.encode_own_inputs(&garbler_bits)?;
            let pairs = garbler.evaluator_input_pairs();

            let evaluator_bits = match evaluator_bits {
                Some(bits) => parse_bits(&bits)?,
                None => (0..pairs.len()).map(|_| rng.random_range(0..2u8)).collect(),
            };

            let outputs = EvaluatorSession::new(circuit.clone(), garbler.tables().to_vec())
                .receive_inputs(garbler_keys, &mut ot, pairs, &evaluator_bits)?
                .evaluate()?;
            let garbled_bits = garbler.decode(&outputs)?;

            let plain_inputs: Vec<bool> = garbler_bits
                .iter()
                .chain(&evaluator_bits)
                .map(|&b| b == 1)
                .collect();
            let plain_bits = circuit.evaluate_plain(&plain_inputs)?;
            if plain_bits != garbled_bits {
                bail!(
                    "Garbled output {} differs from plain output {}",
                    format_bits(&garbled_bits),
                    format_bits(&plain_bits)
                );
            }

            println!("Garbler inputs:   {}", garbler_bits.iter().map(u8::to_string).collect::<String>());
            println!("Evaluator inputs: {}", evaluator_bits.iter().map(u8::to_string).collect::<String>());
            println!("Output:           {}", format_bits(&garbled_bits));
        }
    }

    Ok(())
}
