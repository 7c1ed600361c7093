//! Small builders for the JSON OpenAPI fragments each module contributes.

use serde_json::{json, Map, Value};

/// `$ref` to a component schema.
pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

/// Array of a component schema.
pub fn array_of(name: &str) -> Value {
    json!({ "type": "array", "items": schema_ref(name) })
}

/// JSON response with the given schema.
pub fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

/// Error response using the shared `ErrorResponse` schema.
pub fn error_response(description: &str) -> Value {
    json_response(description, schema_ref("ErrorResponse"))
}

/// Response without a body.
pub fn empty_response(description: &str) -> Value {
    json!({ "description": description })
}

/// Operation object. `body` names the request schema, if any.
pub fn operation(
    summary: &str,
    tag: &str,
    secured: bool,
    body: Option<&str>,
    responses: &[(&str, Value)],
) -> Value {
    let mut op = json!({
        "summary": summary,
        "tags": [tag],
        "responses": responses
            .iter()
            .map(|(code, response)| (code.to_string(), response.clone()))
            .collect::<Map<String, Value>>(),
    });

    if secured {
        op["security"] = json!([{ "bearerAuth": [] }]);
    }

    if let Some(schema) = body {
        op["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": schema_ref(schema) } }
        });
    }

    op
}

/// Object schema from `(name, schema)` pairs.
pub fn object_schema(properties: &[(&str, Value)], required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties
            .iter()
            .map(|(name, schema)| (name.to_string(), schema.clone()))
            .collect::<Map<String, Value>>(),
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_carries_security_and_body() {
        let op = operation(
            "Place order",
            "Orders",
            true,
            Some("PlaceOrder"),
            &[("201", json_response("Created", schema_ref("Order")))],
        );

        assert_eq!(op["tags"][0], "Orders");
        assert_eq!(op["security"][0]["bearerAuth"], json!([]));
        assert_eq!(
            op["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/PlaceOrder"
        );
        assert_eq!(
            op["responses"]["201"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Order"
        );
    }
}
