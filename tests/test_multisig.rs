use serde_json::json;
use tron_devkit::keys::private_key_from_hex;
use tron_devkit::multisig::*;
use tron_devkit::transactions::{SigningError, Transaction};
use tron_devkit::{encode_hex, sha256, Address, AddressConvertible, PrivateKey};

const RAW: &[u8] = b"\x0a\x02\x7f\x01\x22\x08\x01\x02\x03\x04\x05\x06\x07\x08\x5a\x02\x10\x02";

fn key(byte: u8) -> PrivateKey {
    private_key_from_hex(&encode_hex([byte; 32])).unwrap()
}

fn unsigned(owner: &Address, permission_id: u32) -> Transaction {
    Transaction::from_node_response(json!({
        "txID": encode_hex(sha256(RAW)),
        "raw_data": {
            "contract": [{
                "parameter": {
                    "value": {
                        "amount": 5_000_000,
                        "owner_address": owner.to_hex(),
                        "to_address": "41a614f803b6fd780986a42c78ec9c7f77e6ded13c"
                    },
                    "type_url": "type.googleapis.com/protocol.TransferContract"
                },
                "type": "TransferContract",
                "Permission_id": permission_id
            }],
            "expiration": 1_700_000_060_000u64,
            "timestamp": 1_700_000_000_000u64
        },
        "raw_data_hex": encode_hex(RAW)
    }))
    .unwrap()
}

fn two_of_three(id: u32) -> Permission {
    Permission::from_account(
        &json!({
            "address": key(0x01).address().to_hex(),
            "owner_permission": {
                "permission_name": "owner",
                "threshold": 1,
                "keys": [{"address": key(0x01).address().to_hex(), "weight": 1}]
            },
            "active_permission": [{
                "type": "Active",
                "id": id,
                "permission_name": "treasury",
                "threshold": 2,
                "operations": "0100000000000000000000000000000000000000000000000000000000000000",
                "keys": [
                    {"address": key(0x0a).address().to_base58(), "weight": 1},
                    {"address": key(0x0b).address().to_base58(), "weight": 1},
                    {"address": key(0x0c).address().to_base58(), "weight": 1}
                ]
            }]
        }),
        id,
    )
    .unwrap()
}

#[test]
fn test_threshold_accumulates() {
    let owner = key(0x01).address();
    let permission = two_of_three(2);
    let tx = unsigned(&owner, 2);

    let weight = resolve_sign_weight(&tx, &permission, &key(0x0a).address()).unwrap();
    assert_eq!(weight.current_weight, 0);
    assert_eq!(weight.signer_weight, 1);
    assert_eq!(weight.threshold, 2);

    let tx = multi_sign(tx, &key(0x0a), &permission).unwrap();
    let weight = resolve_sign_weight(&tx, &permission, &key(0x0b).address()).unwrap();
    assert_eq!(weight.current_weight, 1);
    assert!(!weight.is_satisfied());
    assert_eq!(weight.weight_after_signing(), 2);

    let tx = multi_sign(tx, &key(0x0b), &permission).unwrap();
    let weight = resolve_sign_weight(&tx, &permission, &key(0x0c).address()).unwrap();
    assert_eq!(weight.current_weight, 2);
    assert!(weight.is_satisfied());
    assert_eq!(
        weight.approved,
        vec![key(0x0a).address(), key(0x0b).address()]
    );
}

#[test]
fn test_repeated_signer() {
    let permission = two_of_three(2);
    let tx = multi_sign(unsigned(&key(0x01).address(), 2), &key(0x0a), &permission).unwrap();
    assert_eq!(
        multi_sign(tx, &key(0x0a), &permission).unwrap_err(),
        SigningError::AlreadySigned(key(0x0a).address().to_base58())
    );
}

#[test]
fn test_unlisted_signer() {
    let permission = two_of_three(2);
    let tx = unsigned(&key(0x01).address(), 2);
    assert!(matches!(
        multi_sign(tx, &key(0x0d), &permission),
        Err(SigningError::PermissionDenied(_))
    ));
}

#[test]
fn test_permission_id_mismatch() {
    let permission = two_of_three(3);
    let tx = unsigned(&key(0x01).address(), 2);
    assert!(matches!(
        multi_sign(tx, &key(0x0a), &permission),
        Err(SigningError::PermissionDenied(_))
    ));
}

#[test]
fn test_node_approved_list() {
    let permission = two_of_three(2);
    let tx = multi_sign(unsigned(&key(0x01).address(), 2), &key(0x0a), &permission).unwrap();

    let request = sign_weight_request(&tx);
    assert_eq!(request.path, "wallet/getsignweight");
    assert_eq!(request.fields["txID"], json!(tx.id_hex()));

    let response = json!({
        "result": {"code": "NOT_ENOUGH_PERMISSION"},
        "approved_list": [key(0x0a).address().to_hex()],
        "permission": {"threshold": 2},
        "current_weight": 1
    });
    let approved = approved_list_from_response(&response);
    let weight = sign_weight_from_approved(&permission, &key(0x0c).address(), approved).unwrap();
    assert_eq!(weight.current_weight, 1);
    assert!(!weight.already_signed);
    assert_eq!(weight.weight_after_signing(), 2);
}

#[test]
fn test_owner_permission_with_multiple_keys() {
    let owner = key(0x01);
    let permission = Permission {
        kind: PermissionKind::Owner,
        id: 0,
        permission_name: "owner".to_string(),
        threshold: 2,
        keys: vec![
            PermissionKey { address: owner.address(), weight: 1 },
            PermissionKey { address: key(0x02).address(), weight: 1 },
        ],
        operations: None,
    };
    let tx = unsigned(&owner.address(), 0).sign(&owner).unwrap();
    let tx = multi_sign(tx, &key(0x02), &permission).unwrap();
    assert_eq!(tx.signatures().len(), 2);
    assert!(resolve_sign_weight(&tx, &permission, &owner.address())
        .unwrap()
        .is_satisfied());
}

#[test]
fn test_maximal_weights_from_account() {
    let account = json!({
        "active_permission": [{
            "type": "Active",
            "id": 2,
            "threshold": u64::MAX,
            "keys": [
                {"address": key(0x0a).address().to_hex(), "weight": u64::MAX},
                {"address": key(0x0b).address().to_hex(), "weight": u64::MAX}
            ]
        }]
    });
    let permission = Permission::from_account(&account, 2).unwrap();
    let tx = multi_sign(unsigned(&key(0x01).address(), 2), &key(0x0a), &permission).unwrap();
    let weight = resolve_sign_weight(&tx, &permission, &key(0x0b).address()).unwrap();
    assert_eq!(weight.current_weight, u64::MAX);
    assert_eq!(weight.weight_after_signing(), u64::MAX);

    let tx = multi_sign(tx, &key(0x0b), &permission).unwrap();
    let weight = resolve_sign_weight(&tx, &permission, &key(0x0b).address()).unwrap();
    assert!(weight.already_signed);
    assert_eq!(weight.current_weight, u64::MAX);
}
