//! End-to-end transformation scenarios over the public API.

use reshape_engine::{JsonTransformer, transform};
use serde_json::{Value, json};

fn run(template: Value, source: Value) -> Value {
    let transformer = JsonTransformer::from_value(&template).expect("compile template");
    transformer.transform_value(&source).expect("transform")
}

#[test]
fn field_map_builds_nested_targets() {
    let source = json!({ "user": { "name": "John Doe", "email": "john@example.com" } });
    let template = json!({
        "mappings": [
            { "from": "$.user.name", "to": "$.customer.fullName" },
            { "from": "$.user.email", "to": "$.customer.contact.email" }
        ]
    });
    assert_eq!(
        run(template, source),
        json!({ "customer": { "fullName": "John Doe", "contact": { "email": "john@example.com" } } })
    );
}

#[test]
fn if_else_chain_classifies_age_bands() {
    let template = json!({
        "mappings": [{
            "to": "$.category",
            "conditions": [{
                "if": "$.user.age >= 65",
                "then": "Senior",
                "else": { "if": "$.user.age >= 18", "then": "Adult", "else": "Minor" }
            }]
        }]
    });
    assert_eq!(run(template, json!({ "user": { "age": 17 } })), json!({ "category": "Minor" }));
}

#[test]
fn sum_avg_count_over_order_totals() {
    let source = json!({ "orders": [{ "total": 100.50 }, { "total": 75.25 }, { "total": 200.00 }] });
    let template = json!({
        "mappings": [
            { "from": "$.orders[*].total", "to": "$.s.totalAmount", "aggregate": "sum" },
            { "from": "$.orders", "to": "$.s.orderCount", "aggregate": "count" },
            { "from": "$.orders[*].total", "to": "$.s.avg", "aggregate": "avg" }
        ]
    });
    assert_eq!(
        run(template, source),
        json!({ "s": { "totalAmount": 375.75, "orderCount": 3, "avg": 125.25 } })
    );
}

#[test]
fn conditional_aggregation_filters_items() {
    let source = json!({
        "transactions": [
            { "amount": 50.5 }, { "amount": 150 }, { "amount": 75 }, { "amount": 200 }, { "amount": 25 }
        ]
    });
    let template = json!({
        "mappings": [{
            "from": "$.transactions[*]",
            "to": "$.total",
            "aggregation": { "type": "sum", "field": "amount", "condition": "$.item.amount > 100" }
        }]
    });
    assert_eq!(run(template, source), json!({ "total": 350 }));
}

#[test]
fn string_operators_combine_with_boolean_logic() {
    let source = json!({ "employee": { "email": "alice.admin@company.com", "department": "IT" } });
    let template = json!({
        "mappings": [{
            "to": "$.accessLevel",
            "conditions": [
                {
                    "if": "$.employee.email contains 'admin' || $.employee.email startsWith 'alice'",
                    "then": "Administrator"
                },
                { "else": true, "then": "External" }
            ]
        }]
    });
    assert_eq!(run(template, source), json!({ "accessLevel": "Administrator" }));
}

#[test]
fn per_item_predicate_counts_matching_files() {
    let source = json!({ "files": [{ "name": "a.pdf" }, { "name": "b.jpg" }, { "name": "c.pdf" }] });
    let template = json!({
        "mappings": [{
            "from": "$.files[*]",
            "to": "$.pdfCount",
            "aggregation": { "type": "count", "condition": "$.item.name endsWith '.pdf'" }
        }]
    });
    assert_eq!(run(template, source), json!({ "pdfCount": 2 }));
}

#[test]
fn nested_template_reshapes_each_item() {
    let source = json!({
        "files": [
            { "name": "a.pdf", "size": 100 },
            { "name": "b.jpg", "size": 2048 }
        ]
    });
    let template = json!({
        "mappings": [{
            "from": "$.files",
            "to": "$.documents",
            "template": {
                "mappings": [
                    { "from": "$.item.name", "to": "file" },
                    { "from": "$.item.size", "to": "bytes" }
                ]
            }
        }]
    });
    assert_eq!(
        run(template, source),
        json!({
            "documents": [
                { "file": "a.pdf", "bytes": 100 },
                { "file": "b.jpg", "bytes": 2048 }
            ]
        })
    );
}

#[test]
fn concat_math_and_defaults_compose() {
    let source = json!({ "product": { "name": "Widget", "price": 19.99, "qty": 3 } });
    let template = json!({
        "mappings": [
            { "to": "$.line", "concat": "{$.product.qty} x {$.product.name}" },
            { "to": "$.total", "math": { "operation": "multiply", "operands": ["$.product.price", "$.product.qty"] } },
            { "from": "$.product.discount", "to": "$.discount", "default": 0 }
        ]
    });
    assert_eq!(
        run(template, source),
        json!({ "line": "3 x Widget", "total": 59.97, "discount": 0 })
    );
}

#[test]
fn recursive_descent_reaches_every_total() {
    let source = json!({
        "q1": { "orders": [{ "total": 10 }] },
        "q2": { "orders": [{ "total": 20 }, { "total": 30 }] }
    });
    let template = json!({
        "mappings": [{ "from": "$..total", "to": "$.grand", "aggregate": "sum" }]
    });
    assert_eq!(run(template, source), json!({ "grand": 60 }));
}

#[test]
fn join_aggregation_with_custom_separator() {
    let source = json!({ "files": [{ "name": "a.pdf" }, { "name": "b.jpg" }] });
    let template = json!({
        "mappings": [{
            "from": "$.files[*]",
            "to": "$.listing",
            "aggregation": { "type": "join", "field": "name", "separator": "; " }
        }]
    });
    assert_eq!(run(template, source), json!({ "listing": "a.pdf; b.jpg" }));
}

#[test]
fn text_entry_point_round_trips() {
    let output = transform(
        r#"{"user":{"name":"John Doe"}}"#,
        r#"{"mappings":[{"from":"$.user.name","to":"$.customer.fullName"}]}"#,
    )
    .expect("transform");
    assert_eq!(output, r#"{"customer":{"fullName":"John Doe"}}"#);
}
