use ethers_core::types::U256;
use proptest::prelude::*;
use serde_json::{Map, Value};
use xrpl_remote_signer::crypto::der::{decode_der, DerEncoder, SECP256K1_ORDER};
use xrpl_remote_signer::utils::DecimalNormalizer;
use xrpl_remote_signer::{
    canonicalize, Amount, BinaryCodec, DerStrategy, RawSignature, Transaction, XrplBinaryCodec,
};

const ACCOUNT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
const DESTINATION: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

fn any_scalar() -> impl Strategy<Value = U256> {
    let order = U256::from_big_endian(&SECP256K1_ORDER);
    prop::array::uniform32(any::<u8>()).prop_filter_map("scalar in [1, n - 1]", move |bytes| {
        let value = U256::from_big_endian(&bytes);
        (!value.is_zero() && value < order).then_some(value)
    })
}

fn small_scalar() -> impl Strategy<Value = U256> {
    (1u64..=u64::MAX).prop_map(U256::from)
}

fn decimal_string() -> impl Strategy<Value = String> {
    ("[1-9][0-9]{0,9}", prop::option::of("[0-9]{1,8}"))
        .prop_map(|(int, frac)| match frac {
            Some(frac) => format!("{}.{}", int, frac),
            None => int,
        })
}

fn issued_payment(value: &str) -> Transaction {
    let mut tx = Transaction::new("Payment", ACCOUNT)
        .with_field("Destination", DESTINATION)
        .unwrap()
        .with_field("Fee", "12")
        .unwrap();
    tx.amount = Some(Amount::issued("USD", DESTINATION, value));
    tx
}

proptest! {
    #[test]
    fn der_encoding_round_trips(r in prop_oneof![any_scalar(), small_scalar()], s in any_scalar()) {
        let raw = RawSignature::new(r, s);
        let library = DerStrategy::Secp256k1.encoder().encode(&raw).unwrap();
        let manual = DerStrategy::Manual.encoder().encode(&raw).unwrap();

        prop_assert_eq!(&library, &manual);
        prop_assert_eq!(decode_der(&manual).unwrap(), raw);
        prop_assert!(manual.len() <= 72);
    }

    #[test]
    fn normalizer_is_idempotent(value in decimal_string()) {
        let normalizer = DecimalNormalizer::default();
        let once = normalizer.normalize(&value).unwrap();
        prop_assert_eq!(normalizer.normalize(&once).unwrap(), once);
    }

    #[test]
    fn trailing_zeros_do_not_change_value(value in decimal_string(), zeros in 1usize..6) {
        let normalizer = DecimalNormalizer::default();
        let padded = if value.contains('.') {
            format!("{}{}", value, "0".repeat(zeros))
        } else {
            format!("{}.{}", value, "0".repeat(zeros))
        };
        prop_assert_eq!(normalizer.normalize(&padded).unwrap(), normalizer.normalize(&value).unwrap());
    }

    #[test]
    fn canonicalize_is_idempotent(value in decimal_string(), zeros in 0usize..4) {
        let padded = if zeros > 0 && value.contains('.') {
            format!("{}{}", value, "0".repeat(zeros))
        } else {
            value
        };
        let once = canonicalize(&issued_payment(&padded)).unwrap();
        prop_assert_eq!(canonicalize(&once).unwrap(), once);
    }

    #[test]
    fn encoding_ignores_key_order(sequence in 1u32.., fee in 10u64..1_000, seed in any::<u64>()) {
        let entries = vec![
            ("TransactionType", Value::from("Payment")),
            ("Account", Value::from(ACCOUNT)),
            ("Destination", Value::from(DESTINATION)),
            ("Amount", Value::from("1000000")),
            ("Fee", Value::from(fee.to_string())),
            ("Sequence", Value::from(sequence)),
            ("Flags", Value::from(0u32)),
        ];
        let mut shuffled = entries.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed % len as u64) as usize);
        if seed & 1 == 1 {
            shuffled.reverse();
        }

        let to_tx = |entries: Vec<(&str, Value)>| {
            let map: Map<String, Value> = entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
            Transaction::from_json_map(map).unwrap()
        };
        let codec = XrplBinaryCodec::default();
        prop_assert_eq!(
            codec.encode(&to_tx(entries)).unwrap(),
            codec.encode(&to_tx(shuffled)).unwrap()
        );
    }
}
