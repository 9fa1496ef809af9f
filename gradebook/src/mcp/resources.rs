//! MCP resources for Gradebook
//!
//! All resources live under `database://csv` and are served as plain text.

use super::protocol::{JsonRpcError, ResourceContents, ResourceDefinition, ResourceTemplate};
use crate::gateway::Gateway;
use percent_encoding::percent_decode_str;

/// Root URI of the database resources
pub const ROOT_URI: &str = "database://csv";

const MIME_TEXT: &str = "text/plain";

/// A parsed resource URI
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceRoute {
    Tables,
    Columns(String),
    Rows(String),
    AllStudents,
    ColumnData(String),
    Query(String),
}

/// Parse a `database://csv/...` URI. Path segments are percent-decoded.
pub fn parse_resource_uri(uri: &str) -> Option<ResourceRoute> {
    let rest = uri.strip_prefix(ROOT_URI)?;
    if rest.is_empty() || rest == "/" {
        return Some(ResourceRoute::Tables);
    }
    let rest = rest.strip_prefix('/')?;

    // The question may itself contain slashes
    if let Some(question) = rest.strip_prefix("query/") {
        let question = percent_decode(question)?;
        return (!question.trim().is_empty()).then_some(ResourceRoute::Query(question));
    }

    let segments: Vec<&str> = rest.split('/').collect();
    let route = match segments.as_slice() {
        ["students", "all", "data"] => ResourceRoute::AllStudents,
        ["students", column, "data"] => ResourceRoute::ColumnData(percent_decode(column)?),
        [table, "columns"] => ResourceRoute::Columns(percent_decode(table)?),
        [table, "rows"] => ResourceRoute::Rows(percent_decode(table)?),
        _ => return None,
    };
    Some(route)
}

/// Decode `%XX` escapes. Malformed escapes pass through unchanged; `None`
/// means the decoded bytes are not UTF-8.
fn percent_decode(input: &str) -> Option<String> {
    percent_decode_str(input)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Concrete resources
pub fn get_resource_definitions() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: ROOT_URI.to_string(),
            name: "tables".to_string(),
            description: "List of the tables in the database".to_string(),
            mime_type: MIME_TEXT.to_string(),
        },
        ResourceDefinition {
            uri: format!("{}/students/all/data", ROOT_URI),
            name: "all_student_data".to_string(),
            description: "Every student row, one per line, as 'column: value' pairs".to_string(),
            mime_type: MIME_TEXT.to_string(),
        },
    ]
}

/// Parameterised resources
pub fn get_resource_templates() -> Vec<ResourceTemplate> {
    let template = |uri: &str, name: &str, description: &str| ResourceTemplate {
        uri_template: format!("{}/{}", ROOT_URI, uri),
        name: name.to_string(),
        description: description.to_string(),
        mime_type: MIME_TEXT.to_string(),
    };

    vec![
        template(
            "{table_name}/columns",
            "columns",
            "Column names of a table, in declaration order",
        ),
        template(
            "{table_name}/rows",
            "rows",
            "Up to 10 rows of a table",
        ),
        template(
            "students/{column_name}/data",
            "column_data",
            "Every value of one column of the students table, one per line",
        ),
        template(
            "query/{question}",
            "query",
            "Answer a natural-language question by generating and running SQL",
        ),
    ]
}

/// Read a resource by URI
pub async fn read_resource(gateway: &Gateway, uri: &str) -> Result<ResourceContents, JsonRpcError> {
    let route = parse_resource_uri(uri)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown resource: {}", uri)))?;

    tracing::debug!("Reading resource {:?}", route);

    let text = match route {
        ResourceRoute::Tables => gateway.list_tables(),
        ResourceRoute::Columns(table) => gateway.list_columns(&table),
        ResourceRoute::Rows(table) => gateway.list_rows(&table),
        ResourceRoute::AllStudents => gateway.list_all_student_data(),
        ResourceRoute::ColumnData(column) => gateway.list_column_data(&column),
        ResourceRoute::Query(question) => gateway.ask_and_execute(&question).await,
    };

    Ok(ResourceContents {
        uri: uri.to_string(),
        mime_type: MIME_TEXT.to_string(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        assert_eq!(parse_resource_uri("database://csv"), Some(ResourceRoute::Tables));
        assert_eq!(parse_resource_uri("database://csv/"), Some(ResourceRoute::Tables));
    }

    #[test]
    fn test_parse_table_routes() {
        assert_eq!(
            parse_resource_uri("database://csv/students/columns"),
            Some(ResourceRoute::Columns("students".to_string()))
        );
        assert_eq!(
            parse_resource_uri("database://csv/students/rows"),
            Some(ResourceRoute::Rows("students".to_string()))
        );
    }

    #[test]
    fn test_all_data_beats_column_data() {
        assert_eq!(
            parse_resource_uri("database://csv/students/all/data"),
            Some(ResourceRoute::AllStudents)
        );
        assert_eq!(
            parse_resource_uri("database://csv/students/grade/data"),
            Some(ResourceRoute::ColumnData("grade".to_string()))
        );
    }

    #[test]
    fn test_parse_query_decodes() {
        assert_eq!(
            parse_resource_uri("database://csv/query/average%20grade%20in%20Math%2FArt%3F"),
            Some(ResourceRoute::Query("average grade in Math/Art?".to_string()))
        );
        assert_eq!(
            parse_resource_uri("database://csv/query/who/passed"),
            Some(ResourceRoute::Query("who/passed".to_string()))
        );
        assert_eq!(parse_resource_uri("database://csv/query/"), None);
    }

    #[test]
    fn test_parse_table_name_decodes() {
        assert_eq!(
            parse_resource_uri("database://csv/my%20table/rows"),
            Some(ResourceRoute::Rows("my table".to_string()))
        );
        assert_eq!(parse_resource_uri("database://csv/students/%FF/data"), None);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(parse_resource_uri("file:///etc/passwd"), None);
        assert_eq!(parse_resource_uri("database://csvx"), None);
        assert_eq!(parse_resource_uri("database://csv/students"), None);
    }

    #[test]
    fn test_percent_decode_utf8() {
        assert_eq!(percent_decode("%C3%A9l%C3%A8ve").as_deref(), Some("élève"));
        assert_eq!(percent_decode("100%").as_deref(), Some("100%"));
        assert_eq!(percent_decode("bad%zz").as_deref(), Some("bad%zz"));
        assert_eq!(percent_decode("%FF%FE"), None);
    }
}
