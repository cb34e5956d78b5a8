use logos::Logos;

use crate::{error::RpnError, interpreter::Ops};


#[derive(Debug, Logos)]
#[logos(skip r"\s+")]
enum Token<'a> {
    #[regex(r"\S+", |lex| lex.slice())]
    Word(&'a str),
}

type ParseResult<O> = Result<O, RpnError>;


/// Splits an input line into the operation list the interpreter consumes.
///
/// Tokens are whitespace separated and lowercased; nothing else is normalised.
/// Classifying a token as a number, command or name is left to the dispatcher.
pub fn tokenize(input: &str) -> ParseResult<Ops> {
    let mut ops = vec![];
    let mut tokenizer = Token::lexer(input);

    while let Some(result) = tokenizer.next() {
        match result {
            Ok(Token::Word(word)) => ops.push(word.to_lowercase()),
            Err(_) => return Err(RpnError::Syntax { offset: tokenizer.span().start })
        }
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn splits_on_any_whitespace() {
        assert_eq!(tokenize("1  2\t+\n").unwrap(), vec!["1", "2", "+"]);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
        assert_eq!(tokenize("   \t ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn lowercases_tokens() {
        assert_eq!(tokenize("PI Dec_Hex #FF8000").unwrap(), vec!["pi", "dec_hex", "#ff8000"]);
    }

    #[test]
    fn keeps_markers_as_separate_tokens_only_when_spaced() {
        assert_eq!(tokenize("( sq dup x )").unwrap(), vec!["(", "sq", "dup", "x", ")"]);
        assert_eq!(tokenize("(sq").unwrap(), vec!["(sq"]);
    }
}
