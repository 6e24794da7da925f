// sig.rs — Signal node model: the variant vocabulary of the signal graph
//
// A signal is a tagged node addressed by a stable `SigId` into the arena
// (`graph.rs`). Nodes are immutable once constructed; structural sharing is
// guaranteed by the hash-consing constructors, so identity (`SigId` equality)
// is the unit of memoization for every rewrite pass.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// ── Identifiers ─────────────────────────────────────────────────────────────

/// Stable identifier of a node in a `SignalGraph` arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SigId(pub u32);

impl fmt::Display for SigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Binding variable of a recursive group. Indexes the graph's definition
/// side table; every group owns exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecVar(pub u32);

impl fmt::Display for RecVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// Identifier of a named table (read-only or read/write).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TableId(pub u32);

// ── Real constants ──────────────────────────────────────────────────────────

/// A real constant, compared and hashed bit-exactly so `Sig` can serve as a
/// hash-consing key. Two NaNs with identical payloads are the same constant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Real(pub f64);

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.to_bits());
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // {:?} keeps the decimal point (1.0, not 1), distinguishing reals
        // from integer constants in printed signals
        write!(f, "{:?}", self.0)
    }
}

// ── Binary operators ────────────────────────────────────────────────────────

/// Operator tag of a binary signal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    And,
    Or,
    Xor,
}

impl BinOp {
    /// Infix symbol used by the pretty printer.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
            BinOp::Ge => ">=",
            BinOp::Le => "<=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
        }
    }

    /// Comparison operators always produce an integer-natured result.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Gt | BinOp::Lt | BinOp::Ge | BinOp::Le | BinOp::Eq | BinOp::Ne
        )
    }
}

// ── Signal node ─────────────────────────────────────────────────────────────

/// A signal-graph node.
///
/// Children are `SigId` references into the same arena. The graph is a DAG
/// except for the one legal cycle shape: a `Proj` referencing a `RecGroup`
/// whose equations (stored in the graph's definition side table) transitively
/// contain projections back to the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sig {
    // ── Literals ──
    IntConst(i64),
    RealConst(Real),
    /// Periodic waveform given as a list of constant entries. A leaf for
    /// rewriting purposes: passes never descend into the entries.
    Waveform(Vec<SigId>),

    // ── I/O ──
    Input(u32),
    Output(u32, SigId),

    // ── Delays ──
    /// One-sample delay.
    Delay1(SigId),
    /// Delay of `sig` by `delay` samples; `delay` must be integer-natured
    /// after promotion.
    FixDelay { sig: SigId, delay: SigId },

    // ── Sequence operations ──
    /// `init` for the first sample, `sig` afterwards.
    Prefix { init: SigId, sig: SigId },
    /// Sample counter modulo the child.
    Iota(SigId),
    /// Table-content generator subgraph. Passes descend into it only when
    /// configured to (see `Transform::visit_generators`).
    Gen(SigId),

    // ── Binary operation ──
    BinOp(BinOp, SigId, SigId),

    // ── Foreign entities ──
    Ffun {
        name: String,
        rtype: String,
        args: Vec<SigId>,
    },
    Fconst {
        ctype: String,
        name: String,
        file: String,
    },
    Fvar {
        ctype: String,
        name: String,
        file: String,
    },

    // ── Tables ──
    Table {
        id: TableId,
        size: SigId,
        init: SigId,
    },
    WrTbl {
        id: TableId,
        table: SigId,
        idx: SigId,
        data: SigId,
    },
    RdTbl { table: SigId, idx: SigId },

    // ── Documentation tables (static diagrams only) ──
    DocConstantTbl { size: SigId, init: SigId },
    DocWriteTbl {
        size: SigId,
        init: SigId,
        idx: SigId,
        data: SigId,
    },
    DocAccessTbl { table: SigId, idx: SigId },

    // ── Selects ──
    Select2 { sel: SigId, x: SigId, y: SigId },
    Select3 {
        sel: SigId,
        x: SigId,
        y: SigId,
        z: SigId,
    },

    // ── Recursion ──
    /// Projection of equation `idx` out of a recursive group.
    Proj { idx: u32, group: SigId },
    /// A recursive group binding `var` to an ordered list of mutually
    /// recursive equations, stored in the graph's definition side table.
    /// An absent definition means the group is currently being rewritten.
    RecGroup { var: RecVar },

    // ── Explicit casts ──
    IntCast(SigId),
    FloatCast(SigId),

    // ── UI controls ──
    Button { label: String },
    Checkbox { label: String },
    VSlider {
        label: String,
        init: SigId,
        min: SigId,
        max: SigId,
        step: SigId,
    },
    HSlider {
        label: String,
        init: SigId,
        min: SigId,
        max: SigId,
        step: SigId,
    },
    NumEntry {
        label: String,
        init: SigId,
        min: SigId,
        max: SigId,
        step: SigId,
    },
    VBargraph {
        label: String,
        min: SigId,
        max: SigId,
        sig: SigId,
    },
    HBargraph {
        label: String,
        min: SigId,
        max: SigId,
        sig: SigId,
    },

    // ── Soundfile accessors ──
    Soundfile { label: String },
    SoundfileLength(SigId),
    SoundfileRate(SigId),
    SoundfileChannels(SigId),
    SoundfileBuffer {
        sf: SigId,
        chan: SigId,
        ridx: SigId,
    },

    // ── Structural combinators ──
    Attach(SigId, SigId),
    Enable(SigId, SigId),
    Control(SigId, SigId),
}

impl Sig {
    /// Structural children of this node, in argument order.
    ///
    /// This enumerates graph edges (used for reachability, nature inference
    /// and DOT output), not rewrite behavior: waveform entries are listed
    /// here even though passes treat waveforms as leaves, and a recursive
    /// group's equations are *not* listed — they live in the graph's
    /// definition side table.
    pub fn children(&self) -> Vec<SigId> {
        match self {
            Sig::IntConst(_)
            | Sig::RealConst(_)
            | Sig::Input(_)
            | Sig::Fconst { .. }
            | Sig::Fvar { .. }
            | Sig::RecGroup { .. }
            | Sig::Button { .. }
            | Sig::Checkbox { .. }
            | Sig::Soundfile { .. } => Vec::new(),

            Sig::Waveform(entries) => entries.clone(),
            Sig::Output(_, x)
            | Sig::Delay1(x)
            | Sig::Iota(x)
            | Sig::Gen(x)
            | Sig::IntCast(x)
            | Sig::FloatCast(x)
            | Sig::SoundfileLength(x)
            | Sig::SoundfileRate(x)
            | Sig::SoundfileChannels(x) => vec![*x],

            Sig::FixDelay { sig, delay } => vec![*sig, *delay],
            Sig::Prefix { init, sig } => vec![*init, *sig],
            Sig::BinOp(_, x, y) => vec![*x, *y],
            Sig::Ffun { args, .. } => args.clone(),
            Sig::Table { size, init, .. } => vec![*size, *init],
            Sig::WrTbl {
                table, idx, data, ..
            } => vec![*table, *idx, *data],
            Sig::RdTbl { table, idx } => vec![*table, *idx],
            Sig::DocConstantTbl { size, init } => vec![*size, *init],
            Sig::DocWriteTbl {
                size,
                init,
                idx,
                data,
            } => vec![*size, *init, *idx, *data],
            Sig::DocAccessTbl { table, idx } => vec![*table, *idx],
            Sig::Select2 { sel, x, y } => vec![*sel, *x, *y],
            Sig::Select3 { sel, x, y, z } => vec![*sel, *x, *y, *z],
            Sig::Proj { group, .. } => vec![*group],
            Sig::VSlider {
                init,
                min,
                max,
                step,
                ..
            }
            | Sig::HSlider {
                init,
                min,
                max,
                step,
                ..
            }
            | Sig::NumEntry {
                init,
                min,
                max,
                step,
                ..
            } => vec![*init, *min, *max, *step],
            Sig::VBargraph { min, max, sig, .. } | Sig::HBargraph { min, max, sig, .. } => {
                vec![*min, *max, *sig]
            }
            Sig::SoundfileBuffer { sf, chan, ridx } => vec![*sf, *chan, *ridx],
            Sig::Attach(x, y) | Sig::Enable(x, y) | Sig::Control(x, y) => vec![*x, *y],
        }
    }

    /// Short opcode name (DOT labels, diagnostics).
    pub fn opcode(&self) -> &'static str {
        match self {
            Sig::IntConst(_) => "int",
            Sig::RealConst(_) => "real",
            Sig::Waveform(_) => "waveform",
            Sig::Input(_) => "input",
            Sig::Output(..) => "output",
            Sig::Delay1(_) => "delay1",
            Sig::FixDelay { .. } => "delay",
            Sig::Prefix { .. } => "prefix",
            Sig::Iota(_) => "iota",
            Sig::Gen(_) => "gen",
            Sig::BinOp(..) => "binop",
            Sig::Ffun { .. } => "ffun",
            Sig::Fconst { .. } => "fconst",
            Sig::Fvar { .. } => "fvar",
            Sig::Table { .. } => "table",
            Sig::WrTbl { .. } => "writetable",
            Sig::RdTbl { .. } => "readtable",
            Sig::DocConstantTbl { .. } => "docconstanttbl",
            Sig::DocWriteTbl { .. } => "docwritetbl",
            Sig::DocAccessTbl { .. } => "docaccesstbl",
            Sig::Select2 { .. } => "select2",
            Sig::Select3 { .. } => "select3",
            Sig::Proj { .. } => "proj",
            Sig::RecGroup { .. } => "rec",
            Sig::IntCast(_) => "intcast",
            Sig::FloatCast(_) => "floatcast",
            Sig::Button { .. } => "button",
            Sig::Checkbox { .. } => "checkbox",
            Sig::VSlider { .. } => "vslider",
            Sig::HSlider { .. } => "hslider",
            Sig::NumEntry { .. } => "nentry",
            Sig::VBargraph { .. } => "vbargraph",
            Sig::HBargraph { .. } => "hbargraph",
            Sig::Soundfile { .. } => "soundfile",
            Sig::SoundfileLength(_) => "sf_length",
            Sig::SoundfileRate(_) => "sf_rate",
            Sig::SoundfileChannels(_) => "sf_channels",
            Sig::SoundfileBuffer { .. } => "sf_buffer",
            Sig::Attach(..) => "attach",
            Sig::Enable(..) => "enable",
            Sig::Control(..) => "control",
        }
    }
}
