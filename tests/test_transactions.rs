use serde_json::{json, Value};
use tron_devkit::keys::{private_key_from_hex, Signature};
use tron_devkit::transactions::*;
use tron_devkit::{encode_hex, sha256, Address, AddressConvertible, PrivateKey};

const RAW: &[u8] = b"\x0a\x02\x1b\x2c\x22\x08\x9a\x0b\x3c\x4d\x5e\x6f\x70\x81\x40\xe0\xa7\x9b\x91\xc6\x31";

fn key(byte: u8) -> PrivateKey {
    private_key_from_hex(&encode_hex([byte; 32])).unwrap()
}

fn transfer_json(owner: &Address, permission_id: Option<u32>) -> Value {
    let mut contract = json!({
        "parameter": {
            "value": {
                "amount": 1_000_000,
                "owner_address": owner.to_hex(),
                "to_address": "41a614f803b6fd780986a42c78ec9c7f77e6ded13c"
            },
            "type_url": "type.googleapis.com/protocol.TransferContract"
        },
        "type": "TransferContract"
    });
    if let Some(id) = permission_id {
        contract["Permission_id"] = json!(id);
    }
    json!({
        "visible": false,
        "txID": encode_hex(sha256(RAW)),
        "raw_data": {
            "contract": [contract],
            "ref_block_bytes": "1b2c",
            "ref_block_hash": "9a0b3c4d5e6f7081",
            "expiration": 1_700_000_060_000u64,
            "timestamp": 1_700_000_000_000u64
        },
        "raw_data_hex": encode_hex(RAW)
    })
}

#[test]
fn test_sign_owner_transaction() {
    let owner = key(0x11);
    let tx = Transaction::from_node_response(transfer_json(&owner.address(), None)).unwrap();
    assert_eq!(tx.id(), sha256(RAW));
    assert_eq!(tx.raw_data_hex(), RAW);
    assert!(!tx.visible());

    let signed = tx.sign(&owner).unwrap();
    assert!(signed.is_signed());
    assert_eq!(signed.signatures().len(), 1);
    assert_eq!(signed.signers().unwrap(), vec![owner.address()]);
}

#[test]
fn test_sign_rejects_other_key() {
    let owner = key(0x11);
    let stranger = key(0x22);
    let tx = Transaction::from_node_response(transfer_json(&owner.address(), None)).unwrap();
    assert_eq!(
        tx.sign(&stranger).unwrap_err(),
        SigningError::OwnerMismatch {
            owner: owner.address().to_base58(),
            signer: stranger.address().to_base58(),
        }
    );
}

#[test]
fn test_sign_twice() {
    let owner = key(0x11);
    let tx = Transaction::from_node_response(transfer_json(&owner.address(), None)).unwrap();
    let signed = tx.sign(&owner).unwrap();
    assert_eq!(
        signed.sign(&owner).unwrap_err(),
        SigningError::AlreadySigned(owner.address().to_base58())
    );
}

#[test]
fn test_active_permission_skips_owner_check() {
    let owner = key(0x11);
    let delegate = key(0x33);
    let tx = Transaction::from_node_response(transfer_json(&owner.address(), Some(2))).unwrap();
    assert_eq!(tx.permission_id(), 2);
    let signed = tx.sign(&delegate).unwrap();
    assert_eq!(signed.signers().unwrap(), vec![delegate.address()]);
}

#[test]
fn test_wrapped_response() {
    let owner = key(0x11);
    let response = json!({
        "result": {"result": true},
        "transaction": transfer_json(&owner.address(), None)
    });
    let tx = Transaction::from_node_response(response).unwrap();
    assert_eq!(tx.owner_address(), Some(owner.address()));
}

#[test]
fn test_node_errors() {
    assert_eq!(
        Transaction::from_node_response(json!({"Error": "class java.lang.NullPointerException : null"}))
            .unwrap_err(),
        TransactionError::NodeError("class java.lang.NullPointerException : null".to_string())
    );
    let response = json!({
        "result": {
            "code": "CONTRACT_VALIDATE_ERROR",
            "message": encode_hex("Contract validate error : Validate TransferContract error, balance is not sufficient.")
        }
    });
    assert!(matches!(
        Transaction::from_node_response(response),
        Err(TransactionError::NodeError(msg)) if msg.contains("balance is not sufficient")
    ));
    assert!(matches!(
        Transaction::from_json_str("{\"txID\": 1}"),
        Err(TransactionError::Malformed(_))
    ));
}

#[test]
fn test_tampered_raw_data() {
    let owner = key(0x11);
    let mut value = transfer_json(&owner.address(), None);
    value["raw_data_hex"] = json!(encode_hex(b"\x0a\x02\x00\x00"));
    assert!(matches!(
        Transaction::from_node_response(value),
        Err(TransactionError::IdMismatch { .. })
    ));
}

#[test]
fn test_serde_round_trip() {
    let owner = key(0x11);
    let signed = Transaction::from_node_response(transfer_json(&owner.address(), None))
        .unwrap()
        .sign(&owner)
        .unwrap();
    let text = serde_json::to_string(&signed).unwrap();
    let parsed = Transaction::from_json_str(&text).unwrap();
    assert_eq!(parsed, signed);

    let request = signed.into_broadcast_request();
    assert_eq!(request.path, "wallet/broadcasttransaction");
    let body = request.body();
    assert_eq!(body["txID"], json!(encode_hex(sha256(RAW))));
    let signature: Signature = body["signature"][0].as_str().unwrap().parse().unwrap();
    assert_eq!(signature, parsed.signatures()[0]);
}

#[test]
fn test_message_signing() {
    let signer = key(0x44);
    let message = b"Sign in to TRON dapp";
    let signature = sign_message(message, &signer);
    assert_eq!(recover_message_signer(message, &signature).unwrap(), signer.address());
    assert!(verify_message(message, &signature, &signer.address()));
    assert!(!verify_message(message, &signature, &key(0x45).address()));
    assert_ne!(hash_message(message), tron_devkit::keccak(message));
}
