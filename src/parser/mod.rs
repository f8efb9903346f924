//! Line-oriented, indentation-sensitive parser (spec.md §2, §4.2).

pub mod ast;
pub mod command;
pub mod error;
pub mod expr;
pub mod grammar;

pub use ast::*;
pub use error::ParseError;
pub use grammar::parse;

#[cfg(test)]
mod tests {
    use super::*;

    fn commands_of(src: &str) -> (TopLevel, Vec<ParseError>) {
        parse(src)
    }

    #[test]
    fn left_to_right_precedence_parses_as_one_write_arg() {
        let (top, errors) = commands_of(" w 3+4*3");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top.commands.len(), 1);
        assert!(matches!(top.commands[0].kind, CommandKind::Write(_)));
    }

    #[test]
    fn missing_leading_whitespace_is_a_parse_error() {
        let (_, errors) = commands_of("w 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 0);
        assert_eq!(errors[0].column, 2);
    }

    #[test]
    fn inner_whitespace_in_command_args_errors() {
        let (_, errors) = commands_of(" w 3 + 4 - 3");
        assert!(!errors.is_empty());
    }

    #[test]
    fn for_loop_with_sweep_argument() {
        let (top, errors) = commands_of("f i=1:1:5 w !,\"i: \",i");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top.commands.len(), 1);
        match &top.commands[0].kind {
            CommandKind::For(Some(arg), body) => {
                assert_eq!(arg.var, "i");
                assert_eq!(arg.params.len(), 1);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected for with argument, got {other:?}"),
        }
    }

    #[test]
    fn do_block_collects_deeper_indented_lines() {
        let src = "main d\n w 1\n w 2\n w 3";
        let (top, errors) = commands_of(src);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top.tags.get("main").map(|t| t.index), Some(0));
        match &top.commands[0].kind {
            CommandKind::DoBlock(body) => assert_eq!(body.len(), 3),
            other => panic!("expected a do block, got {other:?}"),
        }
    }

    #[test]
    fn command_prefix_parsing() {
        let (top, errors) = commands_of(" wRIte !,\"Hello, world\"");
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(top.commands[0].kind, CommandKind::Write(_)));
    }
}
