//! Prompt construction for text-to-SQL

use super::extract::SQL_QUERY_MARKER;

/// Appended to every question so the model prefers full-width queries
pub const COMPLETE_QUERY_HINT: &str = "Give a complete SQL query with all columns if possible.";

/// Build the text-to-SQL prompt for a question over the given schema.
///
/// The prompt ends with the `SQLQuery:` cue so the model answers with the
/// query directly after it.
pub fn build_prompt(question: &str, schema: &str, top_k: usize) -> String {
    format!(
        "You are a SQLite expert. Given an input question, write one syntactically \
         correct SQLite query that answers it.\n\
         Unless the question asks for a specific number of rows, return at most {top_k} \
         results using a LIMIT clause.\n\
         Only use column names that appear in the tables below, and wrap each column \
         name in double quotes.\n\
         Use date('now') if the question involves \"today\".\n\
         \n\
         Use the following format:\n\
         \n\
         Question: the question here\n\
         {marker} the SQL query to run\n\
         \n\
         Only use the following tables:\n\
         {schema}\n\
         \n\
         Question: {question} {hint}\n\
         {marker} ",
        top_k = top_k,
        marker = SQL_QUERY_MARKER,
        schema = schema,
        question = question.trim(),
        hint = COMPLETE_QUERY_HINT,
    )
}
