//! Property-based tests for `SecretService`
//!
//! 1. **Expiration**: creation succeeds iff expiration is 3600, 86400 or
//!    604800
//! 2. **Length**: creation succeeds iff the message fits `max_length`
//! 3. **Chaos**: injected store failures surface as backend errors and never
//!    corrupt the lifecycle of secrets that were stored

use proptest::prelude::*;
use vanish_core::{ChaoticStore, MemoryStore, Policy, SecretService, ServiceError, ValidationError};
use vanish_harness::SimEnv;
use vanish_proto::Secret;

fn service(policy: Policy, seed: u64) -> SecretService<MemoryStore<SimEnv>, SimEnv> {
    let env = SimEnv::with_seed(seed);
    SecretService::new(MemoryStore::new(env.clone()), env, policy)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_create_succeeds_iff_expiration_valid(
        expiration in prop_oneof![
            Just(3600),
            Just(86_400),
            Just(604_800),
            any::<i32>(),
            -10i32..700_000,
        ],
        one_time in any::<bool>(),
    ) {
        let service = service(Policy::default(), 1);
        let secret = Secret { expiration, message: "ciphertext".to_string(), one_time };
        let valid = matches!(expiration, 3600 | 86_400 | 604_800);

        match service.create_secret(&secret) {
            Ok(id) => {
                prop_assert!(valid);
                prop_assert_eq!(service.retrieve_secret(&id).unwrap(), secret);
            },
            Err(err) => {
                prop_assert!(!valid);
                prop_assert_eq!(err, ServiceError::Validation(ValidationError::InvalidExpiration));
            },
        }
    }

    #[test]
    fn prop_length_limit(len in 0usize..200, max_length in 0usize..200) {
        let service = service(Policy { max_length, ..Policy::default() }, 2);
        let secret = Secret { expiration: 3600, message: "a".repeat(len), one_time: false };

        let result = service.create_secret(&secret);
        if len <= max_length {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result, Err(ServiceError::Validation(ValidationError::MessageTooLong)));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_chaos_only_produces_backend_errors(seed in any::<u64>(), rate in 0.0f64..0.8) {
        let env = SimEnv::with_seed(seed);
        let store = ChaoticStore::with_seed(MemoryStore::new(env.clone()), rate, seed);
        let service = SecretService::new(store.clone(), env, Policy::default());

        for n in 0..20 {
            let secret = Secret { expiration: 3600, message: format!("m{n}"), one_time: n % 2 == 0 };
            let id = match service.create_secret(&secret) {
                Ok(id) => id,
                Err(err) => {
                    prop_assert!(err.is_backend_error(), "unexpected {err:?}");
                    continue;
                },
            };

            match service.retrieve_secret(&id) {
                Ok(read) => prop_assert_eq!(read, secret),
                Err(err) => prop_assert!(err.is_backend_error(), "unexpected {err:?}"),
            }
        }

        prop_assert!(store.operation_count() >= 20);
    }
}
