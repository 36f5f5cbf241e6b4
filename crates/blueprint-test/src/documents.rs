//! JSON policy documents.

use blueprint_core::PolicyDocument;
use serde_json::{json, Value};

/// [`PolicyFixture::valid`](crate::PolicyFixture::valid) as a document.
#[must_use]
pub fn valid_document_json() -> Value {
    json!({
        "functions": [
            {
                "name": "function_name",
                "author": "jdoe",
                "version": 1,
                "state": "Released",
                "description": "Checks whether an array contains a value",
                "policyTypes": ["System"],
                "parameters": ["array", "value"],
                "expression": "array[_] == value"
            },
            {
                "name": "tautology",
                "author": "jdoe",
                "version": 1,
                "state": "Released",
                "description": "Always true",
                "policyTypes": ["System"],
                "expression": "1 == 1"
            }
        ],
        "baseStatements": [
            {
                "name": "Base Statement",
                "author": "jdoe",
                "version": 1,
                "state": "Released",
                "description": "The array contains the value",
                "negationAllowed": true,
                "policyTypes": ["System"],
                "function": "function_name:1",
                "arguments": [
                    {
                        "parameter": "array",
                        "description": "Values to search",
                        "type": "stringArray",
                        "uniqueItems": true
                    },
                    {
                        "parameter": "value",
                        "description": "Value to find",
                        "type": "string"
                    }
                ]
            },
            {
                "name": "Tautology",
                "author": "jdoe",
                "version": 1,
                "state": "Released",
                "description": "Always true",
                "policyTypes": ["System"],
                "function": "tautology:1"
            }
        ],
        "policy": {
            "name": "Valid Policy",
            "author": "jdoe",
            "policyType": "System",
            "clauses": [
                {
                    "statements": [
                        {
                            "baseStatement": "Base Statement:1",
                            "negated": true,
                            "argumentValues": ["foo, bar", "foo"]
                        },
                        { "baseStatement": "Tautology:1" }
                    ]
                }
            ]
        }
    })
}

/// Parses [`valid_document_json`].
///
/// # Panics
///
/// Panics if the fixture no longer matches the document schema.
#[must_use]
pub fn valid_document() -> PolicyDocument {
    serde_json::from_value(valid_document_json()).expect("fixture document should parse")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PolicyFixture;
    use blueprint_core::RootNode;

    #[test]
    fn test_document_matches_fixture() {
        let tree = valid_document().into_tree().unwrap();
        let fixture = PolicyFixture::valid();
        let RootNode::Policy(policy) = tree.root() else {
            panic!("expected a policy root");
        };
        assert_eq!(policy, &fixture.policy);
        assert_eq!(tree.catalog().function_count(), 2);
        assert_eq!(tree.catalog().base_statement_count(), 2);
    }
}
