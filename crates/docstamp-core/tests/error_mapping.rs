use docstamp_core::errors::{ProviderErrorKind, RpcError, StampRevert};
use docstamp_core::{handle_eth_error, AppError, MessageCatalog, PortError, Severity};

const ALL_CODES: [(i64, &str); 17] = [
    (4001, "provider-user-rejected-request"),
    (4100, "provider-unauthorized"),
    (4200, "provider-unsupported-method"),
    (4900, "provider-disconnected"),
    (4901, "provider-chain-disconnected"),
    (-32700, "provider-parse-error"),
    (-32600, "provider-invalid-request"),
    (-32601, "provider-method-not-found"),
    (-32602, "provider-invalid-params"),
    (-32603, "provider-internal-error"),
    (-32000, "provider-invalid-input"),
    (-32001, "provider-resource-not-found"),
    (-32002, "provider-resource-unavailable"),
    (-32003, "provider-transaction-rejected"),
    (-32004, "provider-method-not-supported"),
    (-32005, "provider-limit-exceeded"),
    (-32006, "provider-json-rpc-version-not-supported"),
];

#[test]
fn every_standard_code_maps_to_its_kind() {
    for (code, slug) in ALL_CODES {
        let mapped = handle_eth_error(PortError::Rpc(RpcError::new(code, "boom")));
        let kind = mapped.provider_kind().expect("standard code must map");
        assert_eq!(kind.code(), code);
        assert_eq!(kind.slug(), slug);
        assert_eq!(mapped.message_key(), format!("errors.{slug}"));
        match mapped {
            AppError::Provider(e) => assert_eq!(e.message, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn unknown_codes_pass_through_unchanged() {
    let original = RpcError::new(4902, "Unrecognized chain ID");
    match handle_eth_error(PortError::Rpc(original.clone())) {
        AppError::Port(PortError::Rpc(rpc)) => assert_eq!(rpc, original),
        other => panic!("unexpected {other:?}"),
    }

    let transport = handle_eth_error(PortError::Transport("socket closed".to_owned()));
    assert!(matches!(transport, AppError::Port(PortError::Transport(_))));
    assert_eq!(transport.severity(), Severity::Visible);
}

#[test]
fn user_rejection_is_the_only_silent_error() {
    let rejected = handle_eth_error(PortError::Rpc(RpcError::new(4001, "User rejected")));
    assert_eq!(rejected.severity(), Severity::Silent);
    assert_eq!(
        rejected.provider_kind(),
        Some(ProviderErrorKind::UserRejectedRequest)
    );

    for (code, _) in ALL_CODES.into_iter().filter(|(c, _)| *c != 4001) {
        let mapped = handle_eth_error(PortError::Rpc(RpcError::new(code, "x")));
        assert_eq!(mapped.severity(), Severity::Visible, "code {code}");
    }
}

#[test]
fn english_catalog_covers_every_error_key() {
    let catalog = MessageCatalog::english();
    for kind in ProviderErrorKind::ALL {
        let key = format!("errors.{}", kind.slug());
        assert!(catalog.get(&key).is_some(), "missing {key}");
    }
    for error in [
        AppError::ProviderWrapperMethodNotFound,
        AppError::ContractInstanceUnavailable,
        AppError::Stamp(StampRevert::HashCollision),
        AppError::Stamp(StampRevert::AlreadySigned),
        AppError::Stamp(StampRevert::NotAdmitted),
    ] {
        assert!(catalog.get(&error.message_key()).is_some(), "missing {}", error.message_key());
    }
    assert_eq!(
        catalog.translate("errors.not-a-real-key"),
        catalog.get("errors.default").expect("default message")
    );
}
