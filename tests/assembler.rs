//! End-to-end assembler tests: source text in, packed bit stream out.
//!
//! The output is read back with an MSB-first bit reader, the same order
//! the packer writes in.

use subleqvm::assembler::{Error, assemble};

/// Read `width` bits starting at bit `offset` of an MSB-first packed
/// byte stream.
fn read_bits(bytes: &[u8], offset: u64, width: u32) -> u64 {
    let mut value = 0;
    for i in 0..width as u64 {
        let bit_index = offset + i;
        let byte = bytes[(bit_index / 8) as usize];
        let bit = (byte >> (7 - (bit_index % 8))) & 1;
        value = (value << 1) | bit as u64;
    }
    value
}

#[test]
fn data_words_round_trip() {
    let values: [u64; 5] = [1, 2, 3, (1 << 52) - 1, 0];
    let rom = assemble("DW 1, 2, 3, 4503599627370495, 0").unwrap();
    for (i, &value) in values.iter().enumerate() {
        assert_eq!(read_bits(&rom, 52 * i as u64, 52), value);
    }
}

#[test]
fn negative_values_truncate_to_the_field_width() {
    let rom = assemble("DW -1, -2").unwrap();
    assert_eq!(read_bits(&rom, 0, 52), (1 << 52) - 1);
    assert_eq!(read_bits(&rom, 52, 52), (1 << 52) - 2);
}

#[test]
fn packing_is_msb_first_within_bytes() {
    let rom = assemble("DW 10\nDW 11").unwrap();
    assert_eq!(rom.len(), 13); // 104 bits
    // the top 8 bits of a 52-bit 10 are zero
    assert_eq!(rom[0], 0x00);
    assert_eq!(read_bits(&rom, 0, 52), 10);
    assert_eq!(read_bits(&rom, 52, 52), 11);
}

#[test]
fn forward_references_resolve() {
    let source = "SUBLEQ X, X, NEXT\nNEXT: DW 5\nX: DW 7";
    let rom = assemble(source).unwrap();
    assert_eq!(read_bits(&rom, 0, 26), 130); // X
    assert_eq!(read_bits(&rom, 26, 26), 130);
    assert_eq!(read_bits(&rom, 52, 26), 78); // NEXT
    assert_eq!(read_bits(&rom, 78, 52), 5);
    assert_eq!(read_bits(&rom, 130, 52), 7);
}

#[test]
fn undefined_symbol_is_fatal() {
    let err = assemble("SUBLEQ A, A, 0").unwrap_err();
    assert!(matches!(err, Error::UndefinedSymbol { line_number: 1 }));
}

#[test]
fn labels_are_bit_addresses_of_the_next_emission() {
    let rom = assemble("A:\nDW 9\nDW A").unwrap();
    assert_eq!(read_bits(&rom, 0, 52), 9);
    assert_eq!(read_bits(&rom, 52, 52), 0); // A
}

#[test]
fn label_redefinition_silently_overwrites() {
    let rom = assemble("A: DW 1\nA: DW 2\nDW A").unwrap();
    assert_eq!(read_bits(&rom, 104, 52), 52); // the second definition
}

#[test]
fn case_is_folded_before_parsing() {
    let rom = assemble("start: subleq start, Start, sTART").unwrap();
    for i in 0..3 {
        assert_eq!(read_bits(&rom, 26 * i, 26), 0);
    }
}

#[test]
fn keywords_only_match_on_a_token_boundary() {
    // ORG5 is an identifier, and no macro of that name exists
    let err = assemble("ORG5").unwrap_err();
    assert!(matches!(err, Error::UnknownMacro { .. }));
    // DWX works as a label name
    let rom = assemble("DWX: DW DWX").unwrap();
    assert_eq!(read_bits(&rom, 0, 52), 0);
}

#[test]
fn strings_expand_one_word_per_byte() {
    let rom = assemble("DW 'hi!', 33").unwrap();
    // case folding happens before parsing, so the string is upper-cased
    let expected = [b'H' as u64, b'I' as u64, b'!' as u64, 33];
    for (i, &value) in expected.iter().enumerate() {
        assert_eq!(read_bits(&rom, 52 * i as u64, 52), value);
    }
}

#[test]
fn unterminated_string_is_fatal() {
    let err = assemble("DW 1\nDW 'ABC").unwrap_err();
    assert!(matches!(err, Error::UnterminatedString { line_number: 2 }));
}

#[test]
fn operand_separators_are_whitespace_or_comma() {
    let spaces = assemble("SUBLEQ 1 2 3").unwrap();
    let commas = assemble("SUBLEQ 1,2,3").unwrap();
    let mixed = assemble("SUBLEQ 1 , 2,3").unwrap();
    assert_eq!(spaces, commas);
    assert_eq!(commas, mixed);

    let err = assemble("SUBLEQ 1").unwrap_err();
    assert!(matches!(err, Error::ExpectedArgument { line_number: 1 }));
}

#[test]
fn org_pads_with_zero_words() {
    let rom = assemble("DW 1, 2\nORG 520\nDW 7").unwrap();
    assert_eq!(rom.len(), 72); // 572 bits
    for i in 2..10 {
        assert_eq!(read_bits(&rom, 52 * i, 52), 0);
    }
    assert_eq!(read_bits(&rom, 520, 52), 7);
}

#[test]
fn org_may_land_on_any_bit_address() {
    // 10 is not a multiple of 52: the padding ends in a shorter word
    let rom = assemble("ORG 10\nDW 1").unwrap();
    assert_eq!(read_bits(&rom, 0, 10), 0);
    assert_eq!(read_bits(&rom, 10, 52), 1);
    assert_eq!(rom.len(), 8); // 62 bits
}

#[test]
fn org_cannot_move_backwards() {
    let err = assemble("ORG 104\nORG 52").unwrap_err();
    assert!(matches!(
        err,
        Error::OrgBackwards {
            address: 52,
            size_bits: 104,
            line_number: 2,
        }
    ));
}

#[test]
fn macro_locals_are_hygienic_across_expansions() {
    let source = "MACRO M\nL: DW L\nENDM\nM\nM";
    let rom = assemble(source).unwrap();
    // each expansion's L resolves to its own address
    assert_eq!(read_bits(&rom, 0, 52), 0);
    assert_eq!(read_bits(&rom, 52, 52), 52);
}

#[test]
fn macro_arguments_substitute_into_the_body() {
    let source = "MACRO MOV DST SRC\n\
                  SUBLEQ DST, DST, END\n\
                  SUBLEQ SRC, DST, END\n\
                  END:\n\
                  ENDM\n\
                  X: DW 0\n\
                  Y: DW 0\n\
                  MOV X Y";
    let rom = assemble(source).unwrap();
    let fields: Vec<u64> = (0..6).map(|i| read_bits(&rom, 104 + 26 * i, 26)).collect();
    // X, X, end; Y, X, end -- where end is the expansion-local label
    assert_eq!(fields, vec![0, 0, 260, 52, 0, 260]);
}

#[test]
fn nested_calls_forward_parameters() {
    let source = "MACRO INNER V\n\
                  DW V\n\
                  ENDM\n\
                  MACRO OUTER P\n\
                  INNER P\n\
                  ENDM\n\
                  OUTER 42\n\
                  OUTER 43";
    let rom = assemble(source).unwrap();
    assert_eq!(read_bits(&rom, 0, 52), 42);
    assert_eq!(read_bits(&rom, 52, 52), 43);
}

#[test]
fn macro_argument_count_must_match() {
    let source = "MACRO MOV DST SRC\nSUBLEQ DST, DST, SRC\nENDM\nX: DW 0\nMOV X";
    let err = assemble(source).unwrap_err();
    assert!(matches!(
        err,
        Error::ArgumentCountMismatch {
            expected: 2,
            found: 1,
            line_number: 5,
            ..
        }
    ));
}

#[test]
fn nested_macro_definitions_are_fatal() {
    let err = assemble("MACRO A\nMACRO B\nENDM").unwrap_err();
    assert!(matches!(err, Error::NestedMacro { line_number: 2 }));
}

#[test]
fn endm_takes_no_operands() {
    let err = assemble("MACRO M\nENDM X").unwrap_err();
    assert!(matches!(err, Error::UnexpectedTokens { line_number: 2 }));

    // but a comment is fine
    assemble("MACRO M\nENDM ; done").unwrap();
}

#[test]
fn endm_outside_a_macro_is_fatal() {
    let err = assemble("ENDM").unwrap_err();
    assert!(matches!(err, Error::EndmOutsideMacro { line_number: 1 }));
}

#[test]
fn unclosed_macro_at_end_of_input_is_fatal() {
    let err = assemble("MACRO M\nDW 1").unwrap_err();
    assert!(matches!(err, Error::UnterminatedMacro { .. }));
}

#[test]
fn macro_names_collide_with_labels() {
    let err = assemble("M: DW 1\nMACRO M\nENDM").unwrap_err();
    assert!(matches!(err, Error::SymbolCollision { line_number: 2, .. }));
}

#[test]
fn macro_names_are_not_operands() {
    let err = assemble("MACRO M\nENDM\nDW M").unwrap_err();
    assert!(matches!(err, Error::MacroAsOperand { line_number: 3, .. }));
}

#[test]
fn duplicate_macro_parameters_are_fatal() {
    let err = assemble("MACRO M A A\nENDM").unwrap_err();
    assert!(matches!(err, Error::DuplicateParameter { line_number: 1, .. }));
}

#[test]
fn comments_and_blank_lines_emit_nothing() {
    let rom = assemble("; header\n\n   \nDW 1 ; trailing\n;").unwrap();
    assert_eq!(rom.len(), 7); // one 52-bit word
    assert_eq!(read_bits(&rom, 0, 52), 1);
}

#[test]
fn unexpected_tokens_are_fatal() {
    let err = assemble("DW 1 %").unwrap_err();
    assert!(matches!(err, Error::InvalidWordValue { line_number: 1 }));

    let err = assemble("SUBLEQ 1, 2, 3 4").unwrap_err();
    assert!(matches!(err, Error::UnexpectedTokens { line_number: 1 }));
}

#[test]
fn integer_overflow_has_a_dedicated_diagnostic() {
    let err = assemble("DW 99999999999999999999").unwrap_err();
    assert!(matches!(err, Error::IntegerOverflow { line_number: 1 }));
}

#[test]
fn errors_name_the_source_line() {
    let err = assemble("DW 1\nSUBLEQ 1").unwrap_err();
    assert_eq!(err.to_string(), "expected argument at line 2");
}
