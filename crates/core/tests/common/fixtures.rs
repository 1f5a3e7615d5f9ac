//! Sample backend documents shaped like real CoverIQ responses.

use serde_json::{json, Value};

pub const VALID_URL: &str = "https://www.figma.com/design/AbC123xyz/Checkout?node-id=1-2";

#[allow(dead_code)]
pub const INVALID_URL: &str = "https://www.example.com/design/AbC123xyz";

pub fn design_document() -> Value {
    json!({
        "file_key": "AbC123xyz",
        "figma_data": {
            "name": "Checkout",
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [] }
        }
    })
}

pub fn feature_ack() -> Value {
    json!({ "message": "Feature representation generated" })
}

pub fn feature_document() -> Value {
    json!({
        "features": [
            { "name": "Guest checkout", "components": ["Email field", "Pay button"] }
        ]
    })
}

pub fn test_plan() -> Value {
    json!({
        "test_plan": [
            {
                "Objective": "Verify guest checkout",
                "Scope": "Checkout page",
                "Test_Items": {
                    "Types_of_Testing": "Functional",
                    "Test_Approach": "Manual and automated UI tests",
                    "Acceptance_Criteria": ["Order is placed", "Receipt is shown"]
                }
            }
        ]
    })
}

pub fn test_cases() -> Value {
    json!({
        "Verify guest checkout": {
            "feature": "Guest checkout",
            "bdd_style_descriptions": [
                {
                    "Scenario": "Pay with card",
                    "Given": "a cart with one item",
                    "And": "the user is not signed in",
                    "When": "they pay with a valid card",
                    "Then": "the order is placed"
                }
            ]
        }
    })
}

pub fn feature_archive() -> Vec<u8> {
    b"PK\x03\x04guest_checkout.feature".to_vec()
}

#[allow(dead_code)]
pub fn uploaded_specs() -> Value {
    json!({ "checkout.feature": "Feature: Checkout\n  Scenario: Pay with card" })
}
