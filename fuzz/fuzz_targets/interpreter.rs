#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Builtins, markers and a small pool of names, plus huge and infinite values
// for the counted and range operators.
#[derive(Arbitrary, Debug)]
enum RpnAtom {
    Add, Sub, Mul, Div, Mod, Pow,
    Factorial, Sqrt, Not, ShiftLeft,
    Dup, Drop, DropN, Swap, Rev,
    Roll, RollN, Rot, RotN, Take,
    Head, Tail, Cls, Sum, Avg,
    Iota, To, Proot,
    DecHex, HexDec, HexRgb, RgbHex,
    Store, Map, Fold,
    DefineStart, DefineEnd, Anonymous,

    Huge, Infinite,

    Identifier(u8),
    Number(i8),
}

impl fmt::Display for RpnAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            RpnAtom::Add => "+",
            RpnAtom::Sub => "-",
            RpnAtom::Mul => "x",
            RpnAtom::Div => "/",
            RpnAtom::Mod => "%",
            RpnAtom::Pow => "^",
            RpnAtom::Factorial => "!",
            RpnAtom::Sqrt => "sqrt",
            RpnAtom::Not => "not",
            RpnAtom::ShiftLeft => "<<",
            RpnAtom::Dup => "dup",
            RpnAtom::Drop => "drop",
            RpnAtom::DropN => "dropn",
            RpnAtom::Swap => "swap",
            RpnAtom::Rev => "rev",
            RpnAtom::Roll => "roll",
            RpnAtom::RollN => "rolln",
            RpnAtom::Rot => "rot",
            RpnAtom::RotN => "rotn",
            RpnAtom::Take => "taken",
            RpnAtom::Head => "head",
            RpnAtom::Tail => "tail",
            RpnAtom::Cls => "cls",
            RpnAtom::Sum => "sum",
            RpnAtom::Avg => "avg",
            RpnAtom::Iota => "io",
            RpnAtom::To => "to",
            RpnAtom::Proot => "proot",
            RpnAtom::DecHex => "dec_hex",
            RpnAtom::HexDec => "hex_dec",
            RpnAtom::HexRgb => "hex_rgb",
            RpnAtom::RgbHex => "rgb_hex",
            RpnAtom::Store => "store",
            RpnAtom::Map => "map",
            RpnAtom::Fold => "fold",
            RpnAtom::DefineStart => "(",
            RpnAtom::DefineEnd => ")",
            RpnAtom::Anonymous => "_",
            RpnAtom::Huge => "1e300",
            RpnAtom::Infinite => "0 inv",
            RpnAtom::Identifier(index) => return write!(f, "f{}", index),
            RpnAtom::Number(value) => return write!(f, "{}", value),
        })
    }
}

fuzz_target!(|lines: Vec<Vec<RpnAtom>>| {
    let mut session = rpncalc::Session::with_config(rpncalc::Config {
        max_call_depth: 16,
        max_range_length: 4096,
        ..Default::default()
    });

    for line in lines {
        let line = line.iter().join(" ");
        let _ = session.run_line(&line);
    }
});
