use proptest::prelude::*;

use rawtx_script::script::{script_num_decode, script_num_encode};
use rawtx_script::standard::script_for_destination;
use rawtx_script::{classify, AddressCodec, Destination, Network, Script, StandardAddressCodec};

fn arb_destination() -> impl Strategy<Value = Destination> {
    prop_oneof![
        prop::array::uniform20(any::<u8>()).prop_map(Destination::KeyHash),
        prop::array::uniform20(any::<u8>()).prop_map(Destination::ScriptHash),
        prop::array::uniform20(any::<u8>()).prop_map(Destination::WitnessKeyHash),
        prop::array::uniform32(any::<u8>()).prop_map(Destination::WitnessScriptHash),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn script_num_round_trip(val in -0x7FFF_FFFFi64..=0x7FFF_FFFFi64) {
        prop_assert_eq!(script_num_decode(&script_num_encode(val)), val);
    }

    #[test]
    fn classify_never_panics(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let c = classify(&Script::from_bytes(&data));
        prop_assert!(c.required_sigs <= c.destinations.len().max(1));
    }

    #[test]
    fn destination_script_classifies_back(dest in arb_destination()) {
        let c = classify(&script_for_destination(&dest));
        prop_assert_eq!(c.destinations, vec![dest]);
        prop_assert_eq!(c.required_sigs, 1);
    }

    #[test]
    fn address_text_round_trip(dest in arb_destination()) {
        let codec = StandardAddressCodec::new(Network::Testnet);
        let text = codec.render_address(&dest).expect("render");
        prop_assert_eq!(codec.classify_address(&text), Some(dest));
    }

    #[test]
    fn push_stack_round_trip(stack in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 0..6)) {
        let script = Script::from_push_stack(&stack).expect("encode");
        prop_assert_eq!(script.push_stack().expect("push only"), stack);
    }
}
