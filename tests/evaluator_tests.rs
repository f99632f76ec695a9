// tests/evaluator_tests.rs

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use sieve_lang::ast::IndexRange;
use sieve_lang::{
    Error, EvalError, Evaluator, FieldDef, Link, LinkError, Record, RecordType, Stream, Value,
    apply, materialize, parse,
};

fn eval_expr(expr_str: &str, doc: Value) -> Result<Value, Error> {
    apply(expr_str, doc)
}

fn json_object(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::Object(map)
}

fn json_array(values: Vec<Value>) -> Value {
    Value::Array(values)
}

fn strings(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|s| Value::from(*s)).collect())
}

fn failing_link(message: &'static str) -> Link {
    Link::new(move || -> Result<Value, LinkError> { Err(LinkError::new(message)) })
}

/// A stream of 0, 1, 2, ... that counts how many elements were pulled.
fn counting_stream(pulled: &Rc<Cell<usize>>) -> Stream {
    let pulled = Rc::clone(pulled);
    Stream::new((0..).map(move |i| {
        pulled.set(pulled.get() + 1);
        Value::Integer(i)
    }))
}

fn foo_type() -> Rc<RecordType> {
    RecordType::new(
        "Foo",
        [FieldDef::aliased("Bar", "bar"), FieldDef::new("Baz")],
    )
}

// ============================================================================
// Key and broadcast
// ============================================================================

#[test]
fn test_key_on_scalars_is_null() {
    for doc in [
        Value::Null,
        Value::Boolean(true),
        Value::Integer(3),
        Value::from("abc"),
    ] {
        assert_eq!(eval_expr(".a", doc).unwrap(), Value::Null);
    }
}

#[test]
fn test_broadcast_nested_arrays() {
    let doc = json_array(vec![
        json_array(vec![json_object(vec![("a", Value::Integer(1))])]),
        json_array(vec![json_object(vec![("a", Value::Integer(2))])]),
    ]);
    assert_eq!(
        eval_expr(".a", doc).unwrap(),
        json_array(vec![
            json_array(vec![Value::Integer(1)]),
            json_array(vec![Value::Integer(2)]),
        ])
    );
}

#[test]
fn test_broadcast_missing_keys_are_null() {
    let doc = json_object(vec![(
        "items",
        json_array(vec![
            json_object(vec![("name", Value::from("x"))]),
            json_object(vec![]),
        ]),
    )]);
    assert_eq!(
        eval_expr(".items.name", doc).unwrap(),
        json_array(vec![Value::from("x"), Value::Null])
    );
}

#[test]
fn test_index_on_object_is_null() {
    let doc = json_object(vec![("a", Value::Integer(1))]);
    assert_eq!(eval_expr(".[0]", doc.clone()).unwrap(), Value::Null);
    assert_eq!(eval_expr(".[0:1]", doc).unwrap(), Value::Null);
}

// ============================================================================
// Ranges
// ============================================================================

#[test]
fn test_range_boundaries() {
    let doc = strings(&["a", "b", "c"]);
    let test_cases = vec![
        (".[0:2]", strings(&["a", "b"])),
        (".[1:]", strings(&["b", "c"])),
        (".[:2]", strings(&["a", "b"])),
        (".[0:0]", strings(&[])),
        (".[2:1]", strings(&[])),
        (".[1:99]", strings(&["b", "c"])),
        (".[5:]", strings(&[])),
        (".[]", strings(&["a", "b", "c"])),
        (".[:]", strings(&["a", "b", "c"])),
    ];

    for (expr, expected) in test_cases {
        assert_eq!(
            eval_expr(expr, doc.clone()).unwrap(),
            expected,
            "Failed for expression: {}",
            expr
        );
    }
}

#[test]
fn test_index_range_bounds() {
    assert_eq!(IndexRange::new(1, Some(3)).bounds(5), (1, 3));
    assert_eq!(IndexRange::new(4, Some(2)).bounds(5), (2, 2));
    assert_eq!(IndexRange::new(2, None).bounds(5), (2, 5));
    assert_eq!(IndexRange::new(7, None).bounds(5), (5, 5));
    assert_eq!(IndexRange::all().bounds(5), (0, 5));

    assert!(IndexRange::new(1, Some(3)).contains(2));
    assert!(!IndexRange::new(1, Some(3)).contains(3));
    assert!(IndexRange::new(1, None).contains(1_000));
    assert!(IndexRange::all().contains(0));
}

// ============================================================================
// Text and bytes
// ============================================================================

#[test]
fn test_text_index_and_range() {
    let doc = Value::from("héllo");
    assert_eq!(eval_expr("[1]", doc.clone()).unwrap(), Value::from("é"));
    assert_eq!(eval_expr(".[1:3]", doc.clone()).unwrap(), Value::from("él"));
    assert_eq!(eval_expr(".[3:]", doc.clone()).unwrap(), Value::from("lo"));
    assert_eq!(eval_expr("length", doc).unwrap(), Value::Integer(5));
}

#[test]
fn test_text_index_out_of_range() {
    assert_eq!(
        eval_expr("[9]", Value::from("abc")),
        Err(Error::Eval(EvalError::IndexOutOfRange { index: 9, len: 3 }))
    );
}

#[test]
fn test_bytes() {
    let doc = Value::Bytes(b"hi!".to_vec());
    assert_eq!(eval_expr("[0]", doc.clone()).unwrap(), Value::Integer(104));
    assert_eq!(
        eval_expr(".[1:]", doc.clone()).unwrap(),
        Value::Bytes(b"i!".to_vec())
    );
    assert_eq!(eval_expr("length", doc.clone()).unwrap(), Value::Integer(3));
    assert_eq!(
        eval_expr("[3]", doc),
        Err(Error::Eval(EvalError::IndexOutOfRange { index: 3, len: 3 }))
    );
}

// ============================================================================
// Length
// ============================================================================

#[test]
fn test_length_of_scalars_is_null() {
    for doc in [
        Value::Null,
        Value::Boolean(false),
        Value::Integer(12),
        Value::Float(1.5),
    ] {
        assert_eq!(eval_expr("length", doc).unwrap(), Value::Null);
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_arithmetic_is_exact_for_decimals() {
    let doc = json_object(vec![("a", Value::Float(0.1)), ("b", Value::Float(0.2))]);
    assert_eq!(eval_expr(".a + .b", doc).unwrap(), Value::Float(0.3));
}

#[test]
fn test_arithmetic_mixes_integers_and_floats() {
    let doc = json_object(vec![("a", Value::Integer(3)), ("b", Value::Float(0.5))]);
    assert_eq!(eval_expr(".a * .b", doc.clone()).unwrap(), Value::Float(1.5));
    assert_eq!(eval_expr(".a + .b * 2", doc).unwrap(), Value::Float(4.0));
}

#[test]
fn test_arithmetic_with_negative_literal() {
    assert_eq!(
        eval_expr(". + -2", Value::Integer(5)).unwrap(),
        Value::Float(3.0)
    );
}

#[test]
fn test_arithmetic_falls_back_to_floats() {
    let big = 1e30;
    assert_eq!(
        eval_expr(". * 2", Value::Float(big)).unwrap(),
        Value::Float(big * 2.0)
    );
}

#[test]
fn test_arithmetic_type_error() {
    let doc = json_object(vec![("a", Value::from("x"))]);
    assert_eq!(
        eval_expr(".a * 2", doc),
        Err(Error::Eval(EvalError::TypeError {
            filter: ".a * 2".to_string(),
            found: "string and float".to_string(),
        }))
    );
}

#[test]
fn test_arithmetic_on_missing_key() {
    let err = eval_expr(".missing + 1", json_object(vec![])).unwrap_err();
    assert!(matches!(err, Error::Eval(EvalError::TypeError { .. })));
    assert!(err.to_string().contains("null and float"));
}

#[test]
fn test_error_aborts_pipe() {
    let doc = json_object(vec![("a", json_object(vec![("b", Value::from("x"))]))]);
    assert!(eval_expr(".a | .b * 2 | length", doc).is_err());
}

// ============================================================================
// Object mappings
// ============================================================================

#[test]
fn test_object_mapping() {
    let doc = json_object(vec![
        ("user", json_object(vec![("name", Value::from("ada"))])),
        ("items", strings(&["a", "b", "c"])),
    ]);
    assert_eq!(
        eval_expr("{name: .user.name, n: .items | length, tag: t}", doc).unwrap(),
        json_object(vec![
            ("name", Value::from("ada")),
            ("n", Value::Integer(3)),
            ("tag", Value::from("t")),
        ])
    );
}

#[test]
fn test_empty_object_mapping() {
    assert_eq!(eval_expr("{}", Value::Null).unwrap(), json_object(vec![]));
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_lookup_by_alias_and_name() {
    let record = Record::new(foo_type(), vec![Value::from("b"), Value::Integer(10)]);

    assert_eq!(
        eval_expr(".bar", record.clone().into()).unwrap(),
        Value::from("b")
    );
    assert_eq!(
        eval_expr(".Bar", record.clone().into()).unwrap(),
        Value::from("b")
    );
    assert_eq!(
        eval_expr(".Baz", record.clone().into()).unwrap(),
        Value::Integer(10)
    );
    assert_eq!(eval_expr(".baz", record.clone().into()).unwrap(), Value::Null);
    assert_eq!(eval_expr("length", record.into()).unwrap(), Value::Integer(2));
}

#[test]
fn test_record_alias_shadows_field_name() {
    let ty = RecordType::new("Pair", [FieldDef::new("a"), FieldDef::aliased("b", "a")]);
    let record = Record::new(ty, vec![Value::Integer(1), Value::Integer(2)]);
    assert_eq!(eval_expr(".a", record.into()).unwrap(), Value::Integer(2));
}

#[test]
fn test_record_arithmetic() {
    let record = Record::new(foo_type(), vec![Value::Integer(5), Value::Null]);
    assert_eq!(
        eval_expr(".bar * 5", record.into()).unwrap(),
        Value::Float(25.0)
    );
}

#[test]
fn test_record_broadcast() {
    let ty = foo_type();
    let doc = json_array(vec![
        Record::new(Rc::clone(&ty), vec![Value::from("x")]).into(),
        Record::new(ty, vec![Value::from("y")]).into(),
    ]);
    assert_eq!(eval_expr(".bar", doc).unwrap(), strings(&["x", "y"]));
}

#[test]
fn test_record_padding() {
    let record = Record::new(foo_type(), vec![]);
    assert_eq!(record.len(), 2);
    assert_eq!(record.get("Baz"), Some(&Value::Null));
}

// ============================================================================
// Links
// ============================================================================

#[test]
fn test_link_is_resolved_for_lookup() {
    let target = json_object(vec![("a", Value::from("b"))]);
    let doc = Value::Link(Link::to_value(target));
    assert_eq!(eval_expr(".a", doc).unwrap(), Value::from("b"));
}

#[test]
fn test_link_inside_chain() {
    let inner = Link::to_value(json_object(vec![("b", Value::from("c"))]));
    let doc = json_object(vec![("a", Value::Link(inner))]);
    assert_eq!(eval_expr(".a.b", doc).unwrap(), Value::from("c"));
}

#[test]
fn test_link_to_link() {
    let inner = Link::to_value(strings(&["x", "y"]));
    let outer = Link::to_value(Value::Link(inner));
    assert_eq!(eval_expr("length", outer.into()).unwrap(), Value::Integer(2));
}

#[test]
fn test_link_in_arithmetic() {
    let doc = json_object(vec![("n", Link::to_value(Value::Integer(4)).into())]);
    assert_eq!(eval_expr(".n * 2", doc).unwrap(), Value::Float(8.0));
}

#[test]
fn test_link_resolved_once_per_lookup() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let link = Link::new(move || -> Result<Value, LinkError> {
        counter.set(counter.get() + 1);
        Ok(json_object(vec![("a", Value::Integer(1))]))
    });

    eval_expr(".a", link.into()).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_unresolved_link_is_returned_as_is() {
    let link = failing_link("never resolved");
    let doc = json_object(vec![("a", Value::Link(link.clone()))]);
    match eval_expr(".a", doc).unwrap() {
        Value::Link(found) => assert!(found.ptr_eq(&link)),
        other => panic!("Expected link, got {:?}", other),
    }
}

#[test]
fn test_link_failure_passes_through() {
    let doc = json_object(vec![("a", failing_link("backend offline").into())]);
    let err = eval_expr(".a.b", doc).unwrap_err();
    assert_eq!(
        err,
        Error::Eval(EvalError::LinkResolution(LinkError::new("backend offline")))
    );
    assert!(err.to_string().contains("backend offline"));
}

// ============================================================================
// Streams
// ============================================================================

#[test]
fn test_identity_drains_stream() {
    let stream = Stream::new(vec![Value::Integer(1), Value::Integer(2)]);
    assert_eq!(
        eval_expr(".", stream.into()).unwrap(),
        json_array(vec![Value::Integer(1), Value::Integer(2)])
    );
}

#[test]
fn test_stream_slice_stops_pulling() {
    let pulled = Rc::new(Cell::new(0));
    let stream = counting_stream(&pulled);
    assert_eq!(
        eval_expr(".[1:3]", stream.into()).unwrap(),
        json_array(vec![Value::Integer(1), Value::Integer(2)])
    );
    assert_eq!(pulled.get(), 3);
}

#[test]
fn test_stream_slice_zero_stop_pulls_nothing() {
    let pulled = Rc::new(Cell::new(0));
    let stream = counting_stream(&pulled);
    assert_eq!(eval_expr(".[0:0]", stream.into()).unwrap(), json_array(vec![]));
    assert_eq!(pulled.get(), 0);
}

#[test]
fn test_stream_slice_open_end() {
    let stream = Stream::new((0..5).map(Value::Integer));
    assert_eq!(
        eval_expr(".[3:]", stream.into()).unwrap(),
        json_array(vec![Value::Integer(3), Value::Integer(4)])
    );
}

#[test]
fn test_stream_key_is_lazy() {
    let pulled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&pulled);
    let stream = Stream::new((0..).map(move |i| {
        counter.set(counter.get() + 1);
        json_object(vec![("n", Value::Integer(i))])
    }));

    let output = Evaluator::new()
        .eval(&parse(".n").unwrap(), stream.into())
        .unwrap();
    assert!(matches!(output, Value::Stream(_)));
    assert_eq!(pulled.get(), 0);

    let sliced = Evaluator::new()
        .eval(&parse(".[0:2]").unwrap(), output)
        .unwrap();
    assert_eq!(
        materialize(sliced).unwrap(),
        json_array(vec![Value::Integer(0), Value::Integer(1)])
    );
    assert_eq!(pulled.get(), 2);
}

#[test]
fn test_stream_index_broadcasts_eagerly() {
    let stream = Stream::new(vec![strings(&["a", "b"]), strings(&["c", "d"])]);
    let output = Evaluator::new()
        .eval(&parse("[1]").unwrap(), stream.into())
        .unwrap();
    assert_eq!(output, strings(&["b", "d"]));
}

#[test]
fn test_stream_broadcasts_length_and_literals() {
    let stream = Stream::new(vec![Value::from("ab"), Value::from("abc")]);
    assert_eq!(
        eval_expr("length", stream.into()).unwrap(),
        json_array(vec![Value::Integer(2), Value::Integer(3)])
    );

    let stream = Stream::new(vec![Value::Null, Value::Null]);
    assert_eq!(eval_expr("x", stream.into()).unwrap(), strings(&["x", "x"]));
}

#[test]
fn test_stream_parallel_group_per_element() {
    let stream = Stream::new(vec![
        json_object(vec![("a", Value::Integer(1)), ("b", Value::Integer(2))]),
        json_object(vec![("a", Value::Integer(3)), ("b", Value::Integer(4))]),
    ]);
    assert_eq!(
        eval_expr(".a, .b", stream.into()).unwrap(),
        json_array(vec![
            json_array(vec![Value::Integer(1), Value::Integer(2)]),
            json_array(vec![Value::Integer(3), Value::Integer(4)]),
        ])
    );
}

#[test]
fn test_stream_matches_eager_evaluation() {
    let items = || {
        vec![
            json_object(vec![("name", Value::from("a")), ("tags", strings(&["x"]))]),
            json_object(vec![("name", Value::from("b")), ("tags", strings(&[]))]),
            json_object(vec![("name", Value::from("c")), ("tags", strings(&["y", "z"]))]),
        ]
    };
    let expressions = [
        ".items.name",
        ".items.tags",
        ".items[1:]",
        ".items[:]",
        ".items[0:2] | .name",
        ".items.name[1:]",
        ".items | .tags[0:1]",
    ];

    for expr in expressions {
        let eager = json_object(vec![("items", json_array(items()))]);
        let lazy = json_object(vec![("items", Stream::new(items()).into())]);
        assert_eq!(
            eval_expr(expr, lazy).unwrap(),
            eval_expr(expr, eager).unwrap(),
            "Failed for expression: {}",
            expr
        );
    }
}

fn rows_doc() -> Value {
    json_object(vec![(
        "s",
        Stream::new(vec![
            json_array(vec![Value::Integer(1), Value::Integer(2)]),
            json_array(vec![Value::Integer(3), Value::Integer(4)]),
        ])
        .into(),
    )])
}

fn rows() -> Value {
    json_array(vec![
        json_array(vec![Value::Integer(1), Value::Integer(2)]),
        json_array(vec![Value::Integer(3), Value::Integer(4)]),
    ])
}

#[test]
fn test_parallel_group_drains_shared_stream_in_order() {
    assert_eq!(
        eval_expr(".s | [:], .s | [0]", rows_doc()).unwrap(),
        json_array(vec![rows(), json_array(vec![])])
    );
}

#[test]
fn test_object_mapping_drains_shared_stream_in_order() {
    for _ in 0..20 {
        assert_eq!(
            eval_expr("{a: .s | [:], b: .s | [:]}", rows_doc()).unwrap(),
            json_object(vec![("a", rows()), ("b", json_array(vec![]))])
        );
        assert_eq!(
            eval_expr("{a: .s | [0], b: .s | [1]}", rows_doc()).unwrap(),
            json_object(vec![
                ("a", json_array(vec![Value::Integer(1), Value::Integer(3)])),
                ("b", json_array(vec![])),
            ])
        );
    }
}

#[test]
fn test_materialize_reaches_nested_streams() {
    let ty = foo_type();
    let record = Record::new(
        Rc::clone(&ty),
        vec![Stream::new(vec![Value::Integer(1)]).into()],
    );
    let doc = json_object(vec![
        (
            "outer",
            Stream::new(vec![Stream::new(vec![Value::from("deep")]).into()]).into(),
        ),
        ("record", record.into()),
    ]);

    assert_eq!(
        eval_expr(".", doc).unwrap(),
        json_object(vec![
            ("outer", json_array(vec![strings(&["deep"])])),
            (
                "record",
                Record::new(ty, vec![json_array(vec![Value::Integer(1)])]).into()
            ),
        ])
    );
}

#[test]
fn test_stream_error_aborts() {
    let stream = Stream::from_results(vec![
        Ok(Value::Integer(1)),
        Err(EvalError::LinkResolution(LinkError::new("cursor lost"))),
        Ok(Value::Integer(3)),
    ]);
    assert_eq!(
        eval_expr(".", stream.into()),
        Err(Error::Eval(EvalError::LinkResolution(LinkError::new(
            "cursor lost"
        ))))
    );
}

#[test]
fn test_stream_clones_share_cursor() {
    let mut first = Stream::new((1..=3).map(Value::Integer));
    let second = first.clone();
    assert_eq!(first.next(), Some(Ok(Value::Integer(1))));

    let rest: Vec<Value> = second.map(Result::unwrap).collect();
    assert_eq!(rest, vec![Value::Integer(2), Value::Integer(3)]);
    assert_eq!(first.next(), None);
}

#[test]
fn test_reentrant_pull_is_reported() {
    let slot: Rc<RefCell<Option<Stream>>> = Rc::new(RefCell::new(None));
    let inner = Rc::clone(&slot);
    let mut stream = Stream::from_results(std::iter::from_fn(move || {
        inner.borrow().clone().and_then(|mut s| s.next())
    }));
    *slot.borrow_mut() = Some(stream.clone());

    assert_eq!(stream.next(), Some(Err(EvalError::StreamInUse)));
}
