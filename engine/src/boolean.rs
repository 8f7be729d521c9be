use crate::corpus::DocId;
use crate::index::SearchIndex;
use crate::lemma::Lemmatizer;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

lazy_static! {
    // Operator keywords are case-sensitive and, being earlier alternatives,
    // win over the literal branch at the same position.
    static ref QUERY_RE: Regex = Regex::new(r"\(|\)|AND|OR|NOT|[a-zA-Z]+").expect("valid regex");
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Malformed expression, e.g. a dangling operator. Recoverable: callers
    /// answer with an empty result and report the condition.
    #[error("invalid query syntax")]
    InvalidSyntax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    And,
    Or,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    Operator(Operator),
    GroupOpen,
    GroupClose,
    Literal(String),
}

/// Lex a boolean expression. Anything outside the token pattern (digits,
/// punctuation) never enters the stream; it is unrecognized, not an error.
pub fn tokenize_query(query: &str) -> Vec<QueryToken> {
    QUERY_RE
        .find_iter(query)
        .map(|mat| match mat.as_str() {
            "(" => QueryToken::GroupOpen,
            ")" => QueryToken::GroupClose,
            "AND" => QueryToken::Operator(Operator::And),
            "OR" => QueryToken::Operator(Operator::Or),
            "NOT" => QueryToken::Operator(Operator::Not),
            word => QueryToken::Literal(word.to_string()),
        })
        .collect()
}

/// Shunting-yard conversion to postfix.
///
/// Operators pop while the stack top has precedence >= the incoming token;
/// the `>=` tie-break is what makes consecutive NOTs evaluate inside-out.
/// Mismatched parentheses are tolerated: an unmatched `)` pops what it can,
/// and an unmatched `(` is dropped when the stack drains.
pub fn to_postfix(tokens: Vec<QueryToken>) -> Vec<QueryToken> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut ops: Vec<QueryToken> = Vec::new();

    for token in tokens {
        match token {
            QueryToken::Literal(_) => output.push(token),
            QueryToken::GroupOpen => ops.push(token),
            QueryToken::GroupClose => {
                while let Some(top) = ops.pop() {
                    if top == QueryToken::GroupOpen {
                        break;
                    }
                    output.push(top);
                }
            }
            QueryToken::Operator(op) => {
                while let Some(&QueryToken::Operator(top)) = ops.last() {
                    if top.precedence() >= op.precedence() {
                        output.push(ops.pop().unwrap());
                    } else {
                        break;
                    }
                }
                ops.push(QueryToken::Operator(op));
            }
        }
    }
    while let Some(top) = ops.pop() {
        if top != QueryToken::GroupOpen {
            output.push(top);
        }
    }
    output
}

/// Evaluate a postfix token stream against the boolean postings.
///
/// Literals resolve through the single-word query normalization, then to
/// their posting set (empty when absent). NOT complements against `{1..N}`.
/// Stack underflow reports `InvalidSyntax`; an empty stream yields the
/// empty set.
pub fn evaluate_postfix<L: Lemmatizer + ?Sized>(
    postfix: Vec<QueryToken>,
    index: &SearchIndex,
    lemmatizer: &L,
) -> Result<BTreeSet<DocId>, QueryError> {
    let universe = index.all_doc_ids();
    let mut stack: Vec<BTreeSet<DocId>> = Vec::new();

    for token in postfix {
        match token {
            QueryToken::Literal(word) => {
                let lemma = lemmatizer.normalize_word(&word);
                let set = index.postings(&lemma).cloned().unwrap_or_default();
                stack.push(set);
            }
            QueryToken::Operator(Operator::And) => {
                let rhs = stack.pop().ok_or(QueryError::InvalidSyntax)?;
                let lhs = stack.pop().ok_or(QueryError::InvalidSyntax)?;
                stack.push(lhs.intersection(&rhs).copied().collect());
            }
            QueryToken::Operator(Operator::Or) => {
                let rhs = stack.pop().ok_or(QueryError::InvalidSyntax)?;
                let lhs = stack.pop().ok_or(QueryError::InvalidSyntax)?;
                stack.push(lhs.union(&rhs).copied().collect());
            }
            QueryToken::Operator(Operator::Not) => {
                let operand = stack.pop().ok_or(QueryError::InvalidSyntax)?;
                stack.push(universe.difference(&operand).copied().collect());
            }
            QueryToken::GroupOpen | QueryToken::GroupClose => {
                // to_postfix never emits grouping tokens.
                return Err(QueryError::InvalidSyntax);
            }
        }
    }
    Ok(stack.pop().unwrap_or_default())
}

/// Parse and evaluate a boolean expression over the index. Results iterate
/// in ascending document-id order.
pub fn boolean_search<L: Lemmatizer + ?Sized>(
    index: &SearchIndex,
    lemmatizer: &L,
    query: &str,
) -> Result<BTreeSet<DocId>, QueryError> {
    let postfix = to_postfix(tokenize_query(query));
    evaluate_postfix(postfix, index, lemmatizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> QueryToken {
        QueryToken::Literal(s.to_string())
    }

    #[test]
    fn tokenizes_operators_case_sensitively() {
        let tokens = tokenize_query("(cat AND dog) OR NOT bird");
        assert_eq!(
            tokens,
            vec![
                QueryToken::GroupOpen,
                lit("cat"),
                QueryToken::Operator(Operator::And),
                lit("dog"),
                QueryToken::GroupClose,
                QueryToken::Operator(Operator::Or),
                QueryToken::Operator(Operator::Not),
                lit("bird"),
            ]
        );
        // lower-case keywords are plain literals
        assert_eq!(tokenize_query("cat and dog"), vec![lit("cat"), lit("and"), lit("dog")]);
    }

    #[test]
    fn drops_non_alphabetic_junk() {
        let tokens = tokenize_query("cat && dog 42 !");
        assert_eq!(tokens, vec![lit("cat"), lit("dog")]);
    }

    #[test]
    fn postfix_respects_precedence() {
        // a OR b AND c  =>  a b c AND OR
        let postfix = to_postfix(tokenize_query("a OR b AND c"));
        assert_eq!(
            postfix,
            vec![
                lit("a"),
                lit("b"),
                lit("c"),
                QueryToken::Operator(Operator::And),
                QueryToken::Operator(Operator::Or),
            ]
        );
    }

    #[test]
    fn consecutive_nots_pop_under_the_tie_break() {
        // The >= comparison pops the earlier NOT before the literal arrives,
        // so an unparenthesized double negation leaves a dangling operator.
        let postfix = to_postfix(tokenize_query("NOT NOT a"));
        assert_eq!(
            postfix,
            vec![
                QueryToken::Operator(Operator::Not),
                lit("a"),
                QueryToken::Operator(Operator::Not),
            ]
        );
        // Parenthesized, the inner negation completes first.
        let postfix = to_postfix(tokenize_query("NOT (NOT a)"));
        assert_eq!(
            postfix,
            vec![
                lit("a"),
                QueryToken::Operator(Operator::Not),
                QueryToken::Operator(Operator::Not),
            ]
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        // (a OR b) AND c  =>  a b OR c AND
        let postfix = to_postfix(tokenize_query("(a OR b) AND c"));
        assert_eq!(
            postfix,
            vec![
                lit("a"),
                lit("b"),
                QueryToken::Operator(Operator::Or),
                lit("c"),
                QueryToken::Operator(Operator::And),
            ]
        );
    }

    #[test]
    fn tolerates_mismatched_parentheses() {
        assert_eq!(to_postfix(tokenize_query("a)")), vec![lit("a")]);
        assert_eq!(to_postfix(tokenize_query("(a")), vec![lit("a")]);
        assert_eq!(
            to_postfix(tokenize_query(")a OR b(")),
            vec![lit("a"), lit("b"), QueryToken::Operator(Operator::Or)]
        );
    }
}
