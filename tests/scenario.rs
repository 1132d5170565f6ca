use eds::prelude::*;

fn nested_sample(order_swapped: bool) -> Value {
    let config = Config::default();

    let mut inner = Dict::with_config(&config);
    inner.insert("D", Value::Float(Float::Fixed(Fixed128::new(true, 2, 314))));

    let mut outer = Dict::with_config(&config);
    if order_swapped {
        outer.insert("C", Value::Dict(inner.clone()));
        outer.insert("B", Value::from("Hello World!"));
        outer.insert("A", Value::from(42));
    } else {
        outer.insert("A", Value::from(42));
        outer.insert("B", Value::from("Hello World!"));
        outer.insert("C", Value::Dict(inner));
    }
    Value::Dict(outer)
}

#[test]
fn nested_document_round_trips() {
    let config = Config::default();
    let doc = nested_sample(false);

    let bytes = encode_full(&doc, &config).unwrap();
    let back = decode_full(&bytes, &config).unwrap();

    assert_eq!(back, doc);

    // dictionary equality does not depend on key order
    assert_eq!(back, nested_sample(true));

    // nested float precision survives exactly
    let outer = back.to_dict().unwrap();
    let inner = outer.get("C").unwrap().to_dict().unwrap();
    let d = inner.get("D").unwrap().to_float().unwrap();
    assert_eq!(d.to_fixed(), Some(Fixed128::new(true, 2, 314)));

    // the default configuration compares keys case-insensitively
    assert_eq!(outer.get("a"), outer.get("A"));
}

#[test]
fn nested_document_with_binary_floats() {
    let config = Config::default();

    let mut inner = Dict::with_config(&config);
    inner.insert("D", Value::from(-3.14f64));

    let mut outer = Dict::with_config(&config);
    outer.insert("A", Value::from(42));
    outer.insert("B", Value::from("Hello World!"));
    outer.insert("C", Value::Dict(inner));

    let doc = Value::Dict(outer);
    let bytes = encode_full(&doc, &config).unwrap();
    let back = decode_full(&bytes, &config).unwrap();
    assert_eq!(back, doc);

    let d = back
        .to_dict()
        .unwrap()
        .get("C")
        .unwrap()
        .to_dict()
        .unwrap()
        .get("D")
        .unwrap()
        .to_float()
        .unwrap()
        .clone();
    assert_eq!(d.to_f64(), -3.14f64);
}

#[test]
fn representative_values_round_trip() {
    let config = Config::default();

    let mut sixteen_plain = Dict::with_config(&config);
    let mut sixteen_shared = Dict::with_config(&config);
    for i in 0..16 {
        sixteen_plain.insert(format!("k{:x}", i), Value::from(i));
        sixteen_shared.insert(format!("entry_number_{:02}", i), Value::from(i));
    }
    let mut fifteen = Dict::with_config(&config);
    for i in 0..15 {
        fifteen.insert(format!("k{:x}", i), Value::from(i));
    }

    let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();

    let values = vec![
        Value::Null,
        Value::from(true),
        Value::from(false),
        Value::from(0),
        Value::from(-10000),
        Value::from(i32::max_value()),
        Value::from(i32::min_value()),
        Value::from(0.0f64),
        Value::from(f16::from_f32(65504.0)),
        Value::from(0.1f32),
        Value::from(1.0f64 / 3.0),
        Value::from(std::f64::INFINITY),
        Value::from('x'),
        Value::from('Ω'),
        Value::from(uuid),
        Value::from("a".repeat(100)),
        Value::Array(vec![]),
        Value::Array(vec![Value::from(1); 15]),
        Value::Array(vec![Value::from(1); 16]),
        Value::Dict(Dict::with_config(&config)),
        Value::Dict(fifteen),
        Value::Dict(sixteen_plain),
        Value::Dict(sixteen_shared),
    ];

    for v in values {
        let bytes = encode_full(&v, &config).unwrap();
        assert_eq!(decode_full(&bytes, &config).unwrap(), v, "value {}", v);
    }

    // NaN round-trips as a self-equal value under the model's equality
    let nan = Value::from(std::f64::NAN);
    let bytes = encode_full(&nan, &config).unwrap();
    match decode_full(&bytes, &config).unwrap() {
        Value::Float(f) => assert!(f.is_nan()),
        other => panic!("expected a float, got {:?}", other),
    }
}

#[test]
fn compact_and_full_strategies_agree() {
    let full_config = Config::default();
    let compact_config = Config {
        dictionary_strategy: DictionaryStrategy::Compact,
        ..Config::default()
    };

    let mut d = Dict::with_config(&full_config);
    for i in 0..20 {
        d.insert(format!("configuration_item_{:02}", i), Value::from(i));
    }
    let doc = Value::Dict(d);

    let full = encode_full(&doc, &full_config).unwrap();
    let compact = encode_full(&doc, &compact_config).unwrap();

    assert!(compact.len() < full.len());
    assert_eq!(decode_full(&full, &full_config).unwrap(), doc);
    assert_eq!(decode_full(&compact, &compact_config).unwrap(), doc);

    // the two wire forms decode to the same tree regardless of the reader's
    // configured strategy
    assert_eq!(
        decode_full(&compact, &full_config).unwrap(),
        decode_full(&full, &compact_config).unwrap()
    );
}

#[test]
fn case_sensitivity_modes_round_trip_compact_keys() {
    for ignore_case in &[false, true] {
        let config = Config {
            ignore_case: *ignore_case,
            dictionary_strategy: DictionaryStrategy::Compact,
            ..Config::default()
        };
        let mut d = Dict::new(*ignore_case, true);
        for i in 0..16 {
            d.insert(format!("SharedPrefix{:02}", i), Value::from(i));
            d.insert(format!("sharedSuffix{:02}", i), Value::from(i));
        }
        let doc = Value::Dict(d);
        let bytes = encode_full(&doc, &config).unwrap();
        assert_eq!(decode_full(&bytes, &config).unwrap(), doc, "ignore_case={}", ignore_case);
    }
}

#[test]
fn json_import_survives_the_wire() {
    let config = Config::default();
    let doc = Value::from_json(r#"{"A": 42, "B": "Hello World!", "C": {"D": -3.14}}"#).unwrap();

    let bytes = encode_full(&doc, &config).unwrap();
    assert_eq!(decode_full(&bytes, &config).unwrap(), doc);
}
