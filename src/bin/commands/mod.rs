mod match_cmd;
mod parse_cmd;

pub use match_cmd::cmd_match;
pub use parse_cmd::cmd_parse;
