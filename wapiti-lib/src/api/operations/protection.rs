//! Page protection lookup.

use crate::api::extract::Extractor;
use crate::api::params::Param;
use crate::api::params::ParamSet;
use crate::api::query::QueryOperation;
use crate::error::ParamError;
use crate::model::ProtectionInfo;

/// Name of the protection lookup operation.
pub const GET_PROTECTIONS: &str = "get_protections";

/// Declares the protection lookup: `prop=info&inprop=protection` for a
/// batched list of `titles`.
///
/// # Example
///
/// ```ignore
/// use wapiti_lib::api::operations::get_protections;
/// use wapiti_lib::model::FieldValues;
///
/// let infos = get_protections()?
///     .execute(&transport, &FieldValues::new().set("titles", ["Coffee", "Tea"]))
///     .await?;
///
/// for info in infos {
///     println!("{:?}: {:?}", info.title, info.level_for("edit"));
/// }
/// ```
pub fn get_protections() -> Result<QueryOperation<ProtectionInfo>, ParamError> {
    let params = ParamSet::builder()
        .field_prefix("in")
        .param(Param::fixed("action", "query"))
        .param(Param::fixed("format", "json"))
        .param(Param::fixed("prop", "info"))
        .param(Param::fixed("inprop", "protection"))
        .param(Param::multi("titles").required().batched().unprefixed())
        .build()?;

    Ok(QueryOperation::new(
        GET_PROTECTIONS,
        params,
        Extractor::new(["query", "pages"]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValues;

    #[test]
    fn test_declaration() {
        let operation = get_protections().unwrap();
        let frames = operation
            .resolve(&FieldValues::new().set("titles", ["Coffee", "Tea"]))
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].to_query_string(),
            "action=query&format=json&prop=info&inprop=protection&titles=Coffee%7CTea"
        );
    }

    #[test]
    fn test_titles_required() {
        let err = get_protections()
            .unwrap()
            .resolve(&FieldValues::new())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::MissingParameter { ref name, .. } if name == "titles"
        ));
        assert_eq!(err.operation(), GET_PROTECTIONS);
    }
}
