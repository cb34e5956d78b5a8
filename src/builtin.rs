use std::collections::HashMap;
use std::f64::consts::{E, PI};

use itertools::Itertools;
use rand::Rng;
use tracing::warn;

use crate::{
    error::RpnError,
    interpreter::{EvaluationResult, Interpreter, Stack, ANONYMOUS},
    number::{format_number, format_radix, parse_float, parse_int, round_half_up, to_int32},
    recorder::DEFINE_START,
};


/// A builtin operator, tagged by the shape of its stack effect.
///
/// The dispatcher checks [`Builtin::arity`] against the stack before calling
/// [`Builtin::apply`], so every variant may assume its operands are present.
#[derive(Clone, Copy)]
pub(crate) enum Builtin {
    Constant(f64),
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Ternary(fn(f64, f64, f64) -> Vec<f64>),
    /// Reinterprets the top token as text in another representation.
    Convert(fn(&str) -> String),
    /// Fixed arity stack morphism.
    Shape(usize, fn(Stack) -> Stack),
    /// Pops a count N, then rearranges the top N of what remains.
    Counted(fn(Stack, usize) -> Stack),
    /// Emits a message and leaves the stack alone.
    Message(fn(&Interpreter) -> String),
    /// Needs the interpreter itself: definitions, storage and higher order.
    Command(usize, fn(&mut Interpreter, &str, Stack, usize) -> EvaluationResult),
}

impl Builtin {
    pub(crate) fn arity(&self) -> usize {
        match self {
            Self::Constant(_) | Self::Message(_) => 0,
            Self::Unary(_) | Self::Convert(_) | Self::Counted(_) => 1,
            Self::Binary(_) => 2,
            Self::Ternary(_) => 3,
            Self::Shape(arity, _) | Self::Command(arity, _) => *arity,
        }
    }

    pub(crate) fn apply(self, op: &str, interpreter: &mut Interpreter, mut stack: Stack, depth: usize) -> EvaluationResult {
        match self {
            Self::Constant(value) => stack.push(format_number(value)),
            Self::Unary(f) => {
                let a = pop_number(&mut stack);
                stack.push(format_number(f(a)));
            },
            Self::Binary(f) => {
                let b = pop_number(&mut stack);
                let a = pop_number(&mut stack);
                stack.push(format_number(f(a, b)));
            },
            Self::Ternary(f) => {
                let c = pop_number(&mut stack);
                let b = pop_number(&mut stack);
                let a = pop_number(&mut stack);
                stack.extend(f(a, b, c).into_iter().map(format_number));
            },
            Self::Convert(f) => {
                let token = stack.pop().unwrap_or_default();
                stack.push(f(&token));
            },
            Self::Shape(_, f) => return Ok(f(stack)),
            Self::Counted(f) => {
                let count = pop_count(&mut stack);
                if count > stack.len() {
                    return Err(RpnError::StackUnderflow { op: op.to_owned(), needed: count.saturating_add(1), found: stack.len() + 1 });
                }
                return Ok(f(stack, count));
            },
            Self::Message(f) => {
                let message = f(interpreter);
                interpreter.emit(message);
            },
            Self::Command(_, f) => return f(interpreter, op, stack, depth),
        }

        Ok(stack)
    }
}

fn pop_number(stack: &mut Stack) -> f64 {
    stack.pop().map_or(f64::NAN, |token| parse_float(&token))
}

// Counts that are not a number, or negative, select nothing. Huge and
// infinite counts saturate and are caught by the underflow check.
fn pop_count(stack: &mut Stack) -> usize {
    let count = pop_number(stack).trunc();
    if count > 0.0 { count as usize } else { 0 }
}

fn split_top(stack: &mut Stack, count: usize) -> Stack {
    stack.split_off(stack.len() - count)
}

// Unary ------------------------------------------------------------------------

const DEG_PER_RAD: f64 = 180.0 / PI;
const KILOMETERS_PER_MILE: f64 = 1.60934;
const FEET_PER_METER: f64 = 3.28084;

fn sign(a: f64) -> f64 {
    if a == 0.0 || a.is_nan() { a } else { a.signum() }
}

fn random_below(a: f64) -> f64 {
    (a * rand::random::<f64>()).floor()
}

// Product of 1, 2, .. while below a + 1, so fractional inputs truncate.
fn factorial(a: f64) -> f64 {
    let mut product: f64 = 1.0;
    let mut k: f64 = 1.0;
    while k < a + 1.0 && product.is_finite() {
        product *= k;
        k += 1.0;
    }
    product
}

fn triangular(a: f64) -> f64 {
    a * (a + 1.0) / 2.0
}

fn count_ones(a: f64) -> f64 {
    f64::from((to_int32(a) as u32).count_ones())
}

// Binary -----------------------------------------------------------------------

fn power(a: f64, b: f64) -> f64 {
    if b.is_nan() || (a.abs() == 1.0 && b.is_infinite()) { f64::NAN } else { a.powf(b) }
}

fn minimum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }
}

fn maximum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}

fn gcd(a: f64, b: f64) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        return f64::NAN;
    }
    let (mut a, mut b) = (a, b);
    while b != 0.0 {
        (a, b) = (b, a % b);
    }
    a
}

fn bitwise(a: f64, b: f64, f: fn(i32, i32) -> i32) -> f64 {
    f64::from(f(to_int32(a), to_int32(b)))
}

fn shift_amount(b: f64) -> u32 {
    (to_int32(b) as u32) & 31
}

// Roots and ranges -------------------------------------------------------------

/// Both roots of `a x^2 + b x + c` as (real, imaginary) pairs.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        let real = -b / (2.0 * a);
        let imaginary = (-discriminant).sqrt() / (2.0 * a);
        vec![real, imaginary, real, -imaginary]
    } else {
        let root = discriminant.sqrt();
        vec![(-b + root) / (2.0 * a), 0.0, (-b - root) / (2.0 * a), 0.0]
    }
}

/// Closed range from `from` toward `to`; the sign of `step` is ignored.
/// Gives up with `None` once the range would exceed `limit` values.
fn range_to(from: f64, to: f64, step: f64, limit: usize) -> Option<Vec<f64>> {
    let ascending = to > from;
    let step = if ascending { step.abs() } else { -step.abs() };
    let within = |n: f64| if ascending { n <= to } else { n >= to };

    let mut values = vec![];
    let mut n = from;
    while within(n) {
        if values.len() >= limit { return None; }
        values.push(n);
        let next = n + step;
        if next == n || next.is_nan() { break; }
        n = next;
    }
    Some(values)
}

/// `1 ..= n`, nothing when `n` is below one.
fn iota(n: f64, limit: usize) -> Option<Vec<f64>> {
    let mut values = vec![];
    let mut k = 1.0;
    while k < n + 1.0 {
        if values.len() >= limit { return None; }
        values.push(k);
        k += 1.0;
    }
    Some(values)
}

// Conversions ------------------------------------------------------------------

fn dec_asc(token: &str) -> String {
    let code = (to_int32(parse_float(token)) as u32) & 0xffff;
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER).to_string()
}

fn asc_dec(token: &str) -> String {
    format_number(token.encode_utf16().next().map_or(f64::NAN, f64::from))
}

// Stack shape ------------------------------------------------------------------

fn stack_dup(mut stack: Stack) -> Stack {
    if let Some(top) = stack.last().cloned() {
        stack.push(top);
    }
    stack
}

fn stack_drop(mut stack: Stack) -> Stack {
    stack.pop();
    stack
}

fn stack_swap(mut stack: Stack) -> Stack {
    let len = stack.len();
    stack.swap(len - 2, len - 1);
    stack
}

fn stack_reverse(mut stack: Stack) -> Stack {
    stack.reverse();
    stack
}

// Top of stack moves to the bottom.
fn stack_roll(mut stack: Stack) -> Stack {
    stack.rotate_right(1);
    stack
}

// Bottom of stack moves to the top.
fn stack_rot(mut stack: Stack) -> Stack {
    stack.rotate_left(1);
    stack
}

fn stack_head(mut stack: Stack) -> Stack {
    stack.truncate(1);
    stack
}

fn stack_last(mut stack: Stack) -> Stack {
    split_top(&mut stack, 1)
}

fn stack_tail(stack: Stack) -> Stack {
    stack.into_iter().skip(1).collect()
}

fn stack_clear(_stack: Stack) -> Stack {
    Stack::new()
}

fn stack_dropn(mut stack: Stack, count: usize) -> Stack {
    stack.truncate(stack.len() - count);
    stack
}

fn stack_rolln(mut stack: Stack, count: usize) -> Stack {
    stack.rotate_right(count);
    stack
}

fn stack_rotn(mut stack: Stack, count: usize) -> Stack {
    stack.rotate_left(count);
    stack
}

fn stack_taken(mut stack: Stack, count: usize) -> Stack {
    split_top(&mut stack, count)
}

// Aggregates -------------------------------------------------------------------

fn numbers(stack: &Stack) -> impl Iterator<Item = f64> + '_ {
    stack.iter().map(|token| parse_float(token))
}

fn stack_sum(stack: Stack) -> Stack {
    vec![format_number(numbers(&stack).sum())]
}

fn stack_product(stack: Stack) -> Stack {
    vec![format_number(numbers(&stack).product())]
}

fn stack_mean(stack: Stack) -> Stack {
    let sum: f64 = numbers(&stack).sum();
    vec![format_number(sum / stack.len() as f64)]
}


// Colours ----------------------------------------------------------------------

/// Channel values of a hex colour, two digits per channel.
fn hex_channels(colour: &str) -> Vec<f64> {
    let hex = colour.strip_prefix('#').unwrap_or(colour).chars().collect_vec();
    hex.chunks(2)
        .map(|pair| parse_int(&pair.iter().collect::<String>(), 16))
        .collect()
}

fn channel_hex(value: f64) -> String {
    let clamped = if value < 0.0 { 0.0 } else if value > 255.0 { 255.0 } else { value };
    let digits = format_radix(round_half_up(clamped), 16);
    if digits.len() == 1 { format!("0{}", digits) } else { digits }
}

fn scaled_hex(channels: &[String], scale: f64) -> String {
    let digits: String = channels.iter()
        .map(|channel| channel_hex(parse_float(channel) * scale))
        .collect();
    format!("#{}", digits)
}

fn rgb_hex(mut stack: Stack) -> Stack {
    let channels = split_top(&mut stack, 3);
    stack.push(scaled_hex(&channels, 1.0));
    stack
}

fn rgb_scaled(mut stack: Stack) -> Stack {
    let scale = pop_number(&mut stack);
    let channels = split_top(&mut stack, 3);
    stack.push(scaled_hex(&channels, scale));
    stack
}

fn hex_rgb(mut stack: Stack) -> Stack {
    let colour = stack.pop().unwrap_or_default();
    stack.extend(hex_channels(&colour).into_iter().map(format_number));
    stack
}

fn hex_average(mut stack: Stack) -> Stack {
    let colours = split_top(&mut stack, 2)
        .iter()
        .map(|colour| hex_channels(colour))
        .collect_vec();
    let width = colours.iter().map(Vec::len).max().unwrap_or(0);

    let digits: String = (0..width)
        .map(|index| {
            let channel = colours.iter().filter_map(|channels| channels.get(index)).collect_vec();
            let mean = channel.iter().copied().sum::<f64>() / channel.len() as f64;
            channel_hex(mean)
        })
        .collect();

    stack.push(format!("#{}", digits));
    stack
}

// Messages ---------------------------------------------------------------------

const MAGIC8: [&str; 20] = [
    "it is certain",
    "it is decidedly so",
    "without a doubt",
    "yes definitely",
    "you may rely on it",
    "as I see it, yes",
    "most likely",
    "outlook good",
    "yes",
    "signs point to yes",
    "reply hazy try again",
    "ask again later",
    "better not tell you now",
    "cannot predict now",
    "concentrate and ask again",
    "don't count on it",
    "my reply is no",
    "my sources say no",
    "outlook not so good",
    "very doubtful",
];

const HELP: &str = "enter values and commands separated by spaces, e.g. '2 3 +'. \
    '( name ... )' records a function, '( _ ... )' sets the function used by map and fold, \
    'value name store' saves a value, 'cmds' lists the commands and 'cls' clears the stack";

fn magic8(_interpreter: &Interpreter) -> String {
    MAGIC8[rand::rng().random_range(0..MAGIC8.len())].to_owned()
}

fn command_listing(interpreter: &Interpreter) -> String {
    let hidden = &interpreter.config().hidden_commands;
    interpreter.builtin_names()
        .into_iter()
        .filter(|name| !hidden.iter().any(|entry| entry == name))
        .join(" ")
}

fn help(_interpreter: &Interpreter) -> String {
    HELP.to_owned()
}

// Commands ---------------------------------------------------------------------

fn define_start(interpreter: &mut Interpreter, _op: &str, stack: Stack, _depth: usize) -> EvaluationResult {
    interpreter.open_definition();
    Ok(stack)
}

fn store(interpreter: &mut Interpreter, _op: &str, mut stack: Stack, _depth: usize) -> EvaluationResult {
    let name = stack.pop().unwrap_or_default();
    let value = stack.pop().unwrap_or_default();
    interpreter.define(name, vec![value]);
    Ok(stack)
}

fn map(interpreter: &mut Interpreter, _op: &str, stack: Stack, depth: usize) -> EvaluationResult {
    let body = interpreter.anonymous_body()?;

    let mut result = Stack::with_capacity(stack.len());
    for value in stack {
        result.extend(interpreter.call(ANONYMOUS, &body, vec![value], depth)?);
    }
    Ok(result)
}

fn push_range(interpreter: &Interpreter, op: &str, mut stack: Stack, range: Option<Vec<f64>>) -> EvaluationResult {
    let Some(values) = range else {
        let limit = interpreter.config().max_range_length;
        warn!(op, limit, "range exceeds the configured length");
        return Err(RpnError::NonTerminatingReduction { op: op.to_owned(), length: limit });
    };
    stack.extend(values.into_iter().map(format_number));
    Ok(stack)
}

fn count_up(interpreter: &mut Interpreter, op: &str, mut stack: Stack, _depth: usize) -> EvaluationResult {
    let n = pop_number(&mut stack);
    let range = iota(n, interpreter.config().max_range_length);
    push_range(interpreter, op, stack, range)
}

fn count_to(interpreter: &mut Interpreter, op: &str, mut stack: Stack, _depth: usize) -> EvaluationResult {
    let step = pop_number(&mut stack);
    let to = pop_number(&mut stack);
    let from = pop_number(&mut stack);
    let range = range_to(from, to, step, interpreter.config().max_range_length);
    push_range(interpreter, op, stack, range)
}

fn fold(interpreter: &mut Interpreter, op: &str, mut stack: Stack, depth: usize) -> EvaluationResult {
    let body = interpreter.anonymous_body()?;

    while stack.len() > 1 {
        let length = stack.len();
        stack = interpreter.call(ANONYMOUS, &body, stack, depth)?;
        if stack.len() >= length {
            warn!(op, length, "reduction did not shrink the stack");
            return Err(RpnError::NonTerminatingReduction { op: op.to_owned(), length });
        }
    }
    Ok(stack)
}

pub(crate) fn builtin_table() -> HashMap<&'static str, Builtin> {
    HashMap::from([
        ("pi", Builtin::Constant(PI)),
        ("e", Builtin::Constant(E)),

        ("magic8", Builtin::Message(magic8)),
        ("cmds", Builtin::Message(command_listing)),
        ("help", Builtin::Message(help)),

        ("abs", Builtin::Unary(f64::abs)),
        ("chs", Builtin::Unary(|a| -a)),
        ("floor", Builtin::Unary(f64::floor)),
        ("ceil", Builtin::Unary(f64::ceil)),
        ("inv", Builtin::Unary(|a| 1.0 / a)),
        ("ln", Builtin::Unary(f64::ln)),
        ("log", Builtin::Unary(f64::log10)),
        ("log2", Builtin::Unary(f64::log2)),
        ("log10", Builtin::Unary(f64::log10)),
        ("rand", Builtin::Unary(random_below)),
        ("round", Builtin::Unary(round_half_up)),
        ("sgn", Builtin::Unary(sign)),
        ("sqrt", Builtin::Unary(f64::sqrt)),
        ("tng", Builtin::Unary(triangular)),
        ("!", Builtin::Unary(factorial)),

        ("deg_rad", Builtin::Unary(|a| a / DEG_PER_RAD)),
        ("rad_deg", Builtin::Unary(|a| a * DEG_PER_RAD)),
        ("sin", Builtin::Unary(f64::sin)),
        ("cos", Builtin::Unary(f64::cos)),
        ("tan", Builtin::Unary(f64::tan)),
        ("asin", Builtin::Unary(f64::asin)),
        ("acos", Builtin::Unary(f64::acos)),
        ("atan", Builtin::Unary(f64::atan)),

        ("c_f", Builtin::Unary(|a| a * 9.0 / 5.0 + 32.0)),
        ("f_c", Builtin::Unary(|a| (a - 32.0) * 5.0 / 9.0)),
        ("mi_km", Builtin::Unary(|a| a * KILOMETERS_PER_MILE)),
        ("km_mi", Builtin::Unary(|a| a / KILOMETERS_PER_MILE)),
        ("m_ft", Builtin::Unary(|a| a * FEET_PER_METER)),
        ("ft_m", Builtin::Unary(|a| a / FEET_PER_METER)),

        ("+", Builtin::Binary(|a, b| a + b)),
        ("-", Builtin::Binary(|a, b| a - b)),
        ("x", Builtin::Binary(|a, b| a * b)),
        ("/", Builtin::Binary(|a, b| a / b)),
        ("%", Builtin::Binary(|a, b| a % b)),
        ("^", Builtin::Binary(power)),
        ("min", Builtin::Binary(minimum)),
        ("max", Builtin::Binary(maximum)),
        ("nroot", Builtin::Binary(|a, b| power(a, 1.0 / b))),
        ("gcd", Builtin::Binary(gcd)),
        ("logn", Builtin::Binary(|a, b| a.ln() / b.ln())),

        ("and", Builtin::Binary(|a, b| bitwise(a, b, |x, y| x & y))),
        ("or", Builtin::Binary(|a, b| bitwise(a, b, |x, y| x | y))),
        ("xor", Builtin::Binary(|a, b| bitwise(a, b, |x, y| x ^ y))),
        ("nand", Builtin::Binary(|a, b| bitwise(a, b, |x, y| !(x & y)))),
        ("nor", Builtin::Binary(|a, b| bitwise(a, b, |x, y| !(x | y)))),
        ("xnor", Builtin::Binary(|a, b| bitwise(a, b, |x, y| !(x ^ y)))),
        (">>", Builtin::Binary(|a, b| f64::from(to_int32(a) >> shift_amount(b)))),
        ("<<", Builtin::Binary(|a, b| f64::from(to_int32(a).wrapping_shl(shift_amount(b))))),
        ("not", Builtin::Unary(|a| f64::from(!to_int32(a)))),
        ("ones", Builtin::Unary(count_ones)),

        ("proot", Builtin::Ternary(quadratic_roots)),
        ("to", Builtin::Command(3, count_to)),

        ("dec_hex", Builtin::Convert(|token| format_radix(parse_float(token), 16))),
        ("dec_bin", Builtin::Convert(|token| format_radix(parse_float(token), 2))),
        ("dec_oct", Builtin::Convert(|token| format_radix(parse_float(token), 8))),
        ("hex_dec", Builtin::Convert(|token| format_radix(parse_int(token, 16), 10))),
        ("bin_dec", Builtin::Convert(|token| format_radix(parse_int(token, 2), 10))),
        ("oct_dec", Builtin::Convert(|token| format_radix(parse_int(token, 8), 10))),
        ("hex_bin", Builtin::Convert(|token| format_radix(parse_int(token, 16), 2))),
        ("bin_hex", Builtin::Convert(|token| format_radix(parse_int(token, 2), 16))),
        ("dec_asc", Builtin::Convert(dec_asc)),
        ("asc_dec", Builtin::Convert(asc_dec)),

        ("store", Builtin::Command(2, store)),
        (DEFINE_START, Builtin::Command(0, define_start)),
        ("map", Builtin::Command(0, map)),
        ("fold", Builtin::Command(0, fold)),
        ("reduce", Builtin::Command(0, fold)),

        ("rgb_hex", Builtin::Shape(3, rgb_hex)),
        ("rgbx", Builtin::Shape(4, rgb_scaled)),
        ("hex_rgb", Builtin::Shape(1, hex_rgb)),
        ("hex_rgbavg", Builtin::Shape(2, hex_average)),

        ("cls", Builtin::Shape(0, stack_clear)),
        ("drop", Builtin::Shape(1, stack_drop)),
        ("dropn", Builtin::Counted(stack_dropn)),
        ("dup", Builtin::Shape(1, stack_dup)),
        ("rev", Builtin::Shape(0, stack_reverse)),
        ("reverse", Builtin::Shape(0, stack_reverse)),
        ("roll", Builtin::Shape(1, stack_roll)),
        ("rolln", Builtin::Counted(stack_rolln)),
        ("rot", Builtin::Shape(1, stack_rot)),
        ("rotn", Builtin::Counted(stack_rotn)),
        ("swap", Builtin::Shape(2, stack_swap)),
        ("head", Builtin::Shape(1, stack_head)),
        ("tail", Builtin::Shape(0, stack_tail)),
        ("init", Builtin::Shape(0, stack_drop)),
        ("last", Builtin::Shape(1, stack_last)),
        ("taken", Builtin::Counted(stack_taken)),

        ("sum", Builtin::Shape(0, stack_sum)),
        ("prod", Builtin::Shape(0, stack_product)),
        ("avg", Builtin::Shape(0, stack_mean)),
        ("io", Builtin::Command(1, count_up)),
    ])
}
