use clap::Parser;
use std::path::PathBuf;

use sigc::dot::emit_dot;
use sigc::graph::GraphFile;
use sigc::identity::SigIdentity;
use sigc::pp::render_sig;
use sigc::promotion::TypePromotion;
use sigc::sig::SigId;
use sigc::transform::{Transform, TransformError};
use sigc::types::NatureTable;

#[derive(Debug, Clone, clap::ValueEnum)]
enum PassKind {
    Identity,
    Promote,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitKind {
    Pretty,
    Dot,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "sigc",
    version,
    about = "sigc — rewrites serialized signal graphs (type promotion, identity)"
)]
struct Cli {
    /// Input signal-graph JSON file
    graph: PathBuf,

    /// Rewrite pass to run
    #[arg(long, value_enum, default_value_t = PassKind::Promote)]
    pass: PassKind,

    /// Output rendering
    #[arg(long, value_enum, default_value_t = EmitKind::Pretty)]
    emit: EmitKind,

    /// Output file path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print pass phases and node counts
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // ── Load the graph ──
    let text = match std::fs::read_to_string(&cli.graph) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("sigc: error: {}: {}", cli.graph.display(), e);
            std::process::exit(2);
        }
    };
    let mut file: GraphFile = match serde_json::from_str(&text) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("sigc: error: {}: {}", cli.graph.display(), e);
            std::process::exit(2);
        }
    };

    if cli.verbose {
        eprintln!(
            "sigc: loaded {} nodes, {} roots",
            file.graph.len(),
            file.roots.len()
        );
    }

    // ── Run the selected pass ──
    let rewritten: Result<Vec<SigId>, TransformError> = match cli.pass {
        PassKind::Identity => {
            let mut pass = SigIdentity::new();
            file.roots
                .iter()
                .map(|&r| pass.resolve(&mut file.graph, r))
                .collect()
        }
        PassKind::Promote => {
            if cli.verbose {
                eprintln!("sigc: inferring natures");
            }
            let oracle = NatureTable::infer(&file.graph, &file.roots);
            let mut pass = TypePromotion::new(&oracle);
            file.roots
                .iter()
                .map(|&r| pass.resolve(&mut file.graph, r))
                .collect()
        }
    };
    let roots = match rewritten {
        Ok(r) => r,
        Err(e) => {
            eprintln!("sigc: error: {e}");
            std::process::exit(1);
        }
    };

    if cli.verbose {
        eprintln!("sigc: {} nodes after rewrite", file.graph.len());
    }

    // ── Emit ──
    let out = match cli.emit {
        EmitKind::Pretty => {
            let mut s = String::new();
            for &r in &roots {
                s.push_str(&render_sig(&file.graph, r));
                s.push('\n');
            }
            s
        }
        EmitKind::Dot => emit_dot(&file.graph, &roots),
        EmitKind::Json => {
            let out_file = GraphFile {
                graph: file.graph.clone(),
                roots: roots.clone(),
            };
            match serde_json::to_string_pretty(&out_file) {
                Ok(j) => j,
                Err(e) => {
                    eprintln!("sigc: error: {e}");
                    std::process::exit(2);
                }
            }
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, out) {
                eprintln!("sigc: error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
            if cli.verbose {
                eprintln!("sigc: wrote {}", path.display());
            }
        }
        None => print!("{out}"),
    }
}
