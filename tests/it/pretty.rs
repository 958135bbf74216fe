// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use semtrex::parser::parse;
use semtrex::pretty;
use semtrex::semantics::CSTRING;
use semtrex::Registry;

fn registry() -> Registry {
    let mut registry = Registry::new();
    for label in ["A", "B", "C", "G", "TASK", "TITLE", "STATUS", "MY_INT", "lat"] {
        registry.define_symbol(0, CSTRING, label);
    }
    registry
}

#[test]
fn printing_round_trips_through_the_parser() {
    let registry = registry();
    for source in [
        "/A",
        "/A/(B,C)",
        "/A,B|C",
        "/A|B|C",
        "/(A|B),C",
        "/A/B*",
        "/(A,B)?",
        "/A+",
        "/<G:A,B>",
        "/<G:A>*",
        "/{A,B}",
        "/!{A,B}",
        "/!A",
        "/MY_INT=42",
        "/MY_INT!={1,2,42}",
        "/lat=42.25",
        "/lat=-3.5",
        "/A='x'",
        "/A=\"hi\\n\\\"there\\\"\"",
        "/%A",
        "/~A",
        "/~~A",
        "//A",
        "/./A",
        "/TASK/(TITLE,STATUS,.*)",
        "/TASK/(TITLE,.,STATUS?)",
        "/%(A,B)",
        "/(~A)*",
    ] {
        let first = parse(&registry, source).unwrap();
        let printed = pretty::print(&registry, &first);
        let second = parse(&registry, &printed)
            .unwrap_or_else(|e| panic!("cannot re-parse {:?} (from {}): {}", printed, source, e));
        assert_eq!(first, second, "{} printed as {}", source, printed);
    }
}

#[test]
fn canonical_patterns_print_verbatim() {
    let registry = registry();
    for source in [
        "/A",
        "/A/(B,C)",
        "/A,B|C",
        "/<G:A,B>",
        "/MY_INT={1,2,42}",
        "/lat=42.25",
        "/%A",
        "/!{A,B}",
    ] {
        let pattern = parse(&registry, source).unwrap();
        assert_eq!(pretty::print(&registry, &pattern), source);
    }
}

#[test]
fn integral_floats_keep_their_point() {
    let registry = registry();
    let pattern = parse(&registry, "/lat=42.0").unwrap();
    assert_eq!(pretty::print(&registry, &pattern), "/lat=42.0");
    assert_eq!(parse(&registry, "/lat=42.0").unwrap(), pattern);
}
