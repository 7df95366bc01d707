use serde_json::json;
use tron_devkit::abi::{AbiError, AbiValue};
use tron_devkit::config::ProtocolConfig;
use tron_devkit::network::RequestKind;
use tron_devkit::transaction_builder::*;
use tron_devkit::{Address, Amount, U256};

fn addr(byte: u8) -> Address {
    Address::from_identifier([byte; 20])
}

fn trx(value: u64) -> Amount {
    Amount::from_trx(value).unwrap()
}

const PAYABLE_ABI: &str = r#"[
    {"type": "constructor", "stateMutability": "payable", "inputs": [{"name": "owner", "type": "address"}]},
    {"type": "function", "name": "owner", "stateMutability": "view", "inputs": [], "outputs": [{"type": "address"}]}
]"#;

const PLAIN_ABI: &str = r#"[
    {"type": "constructor", "payable": false, "inputs": []}
]"#;

#[test]
fn test_send_trx() {
    let request = TransactionBuilder::new()
        .send_trx(&addr(2), trx(3), &addr(1))
        .expect("Must build");
    assert_eq!(request.path, "wallet/createtransaction");
    assert_eq!(request.kind, RequestKind::Write);
    assert_eq!(
        request.body(),
        json!({
            "owner_address": addr(1).to_hex(),
            "to_address": addr(2).to_hex(),
            "amount": 3_000_000
        })
    );
}

#[test]
fn test_send_trx_validation() {
    let builder = TransactionBuilder::new();
    assert!(matches!(
        builder.send_trx(&addr(2), Amount::ZERO, &addr(1)),
        Err(TransactionBuilderError::InvalidAmount { .. })
    ));
    assert!(matches!(
        builder.send_trx(&addr(1), trx(1), &addr(1)),
        Err(TransactionBuilderError::InvalidAmount { .. })
    ));
}

#[test]
fn test_invalid_address_text() {
    let err: TransactionBuilderError = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6u"
        .parse::<Address>()
        .unwrap_err()
        .into();
    assert!(matches!(err, TransactionBuilderError::InvalidAddress(_)));
}

#[test]
fn test_tokens() {
    let builder = TransactionBuilder::new();
    let request = builder.send_token(&addr(2), 10, "1002000", &addr(1)).unwrap();
    assert_eq!(request.path, "wallet/transferasset");
    assert_eq!(request.fields["asset_name"], json!("31303032303030"));
    assert!(builder.send_token(&addr(2), 0, "1002000", &addr(1)).is_err());
    assert!(matches!(
        builder.send_token(&addr(2), 10, "USDT", &addr(1)),
        Err(TransactionBuilderError::InvalidOption { .. })
    ));

    let request = builder
        .purchase_token(&addr(3), "1002000", trx(100), &addr(1))
        .unwrap();
    assert_eq!(request.path, "wallet/participateassetissue");
    assert_eq!(request.fields["to_address"], json!(addr(3).to_hex()));
}

#[test]
fn test_create_token() {
    let builder = TransactionBuilder::new();
    let options = TokenOptions {
        name: "Devkit".to_string(),
        abbreviation: "DVK".to_string(),
        description: "Test token".to_string(),
        url: "https://example.com".to_string(),
        total_supply: 1_000_000,
        trx_ratio: 1,
        token_ratio: 10,
        sale_start: 1_700_000_000_000,
        sale_end: 1_800_000_000_000,
        free_bandwidth: 100,
        free_bandwidth_limit: 10_000,
        frozen_amount: 1000,
        frozen_duration: 30,
        precision: 6,
    };
    let request = builder.create_token(&options, &addr(1)).unwrap();
    assert_eq!(request.path, "wallet/createassetissue");
    assert_eq!(request.fields["abbr"], json!("44564b"));
    assert_eq!(
        request.fields["frozen_supply"],
        json!({"frozen_amount": 1000, "frozen_days": 30})
    );

    let bad = [
        TokenOptions { name: " ".to_string(), ..options.clone() },
        TokenOptions { total_supply: 0, ..options.clone() },
        TokenOptions { token_ratio: 0, ..options.clone() },
        TokenOptions { precision: 7, ..options.clone() },
        TokenOptions { frozen_amount: 2_000_000, ..options.clone() },
    ];
    for options in bad {
        assert!(builder.create_token(&options, &addr(1)).is_err(), "{options:?}");
    }
    assert!(matches!(
        builder.create_token(
            &TokenOptions { sale_end: options.sale_start, ..options.clone() },
            &addr(1)
        ),
        Err(TransactionBuilderError::InvalidDuration(_))
    ));
    assert!(matches!(
        builder.create_token(&TokenOptions { frozen_duration: 0, ..options }, &addr(1)),
        Err(TransactionBuilderError::InvalidDuration(_))
    ));
}

#[test]
fn test_freeze_v1() {
    let builder = TransactionBuilder::new();
    let request = builder
        .freeze_balance(trx(10), 3, ResourceKind::Energy, &addr(1), Some(&addr(2)))
        .unwrap();
    assert_eq!(
        request.body(),
        json!({
            "owner_address": addr(1).to_hex(),
            "frozen_balance": 10_000_000,
            "frozen_duration": 3,
            "resource": "ENERGY",
            "receiver_address": addr(2).to_hex()
        })
    );
    let request = builder
        .freeze_balance(trx(10), 3, ResourceKind::Bandwidth, &addr(1), Some(&addr(1)))
        .unwrap();
    assert!(!request.fields.contains_key("receiver_address"));

    assert!(matches!(
        builder.freeze_balance(trx(10), 2, ResourceKind::Energy, &addr(1), None),
        Err(TransactionBuilderError::InvalidDuration(_))
    ));
    let relaxed = TransactionBuilder::with_config(ProtocolConfig {
        min_freeze_duration_days: 1,
        ..ProtocolConfig::default()
    });
    assert!(relaxed
        .freeze_balance(trx(10), 2, ResourceKind::Energy, &addr(1), None)
        .is_ok());
    assert!(builder
        .unfreeze_balance(ResourceKind::Energy, &addr(1), None)
        .is_ok());
}

#[test]
fn test_stake_v2() {
    let builder = TransactionBuilder::new();
    let request = builder
        .freeze_balance_v2(trx(5), "BANDWIDTH".parse().unwrap(), &addr(1))
        .unwrap();
    assert_eq!(request.path, "wallet/freezebalancev2");
    assert_eq!(request.fields["resource"], json!("BANDWIDTH"));

    let request = builder
        .unfreeze_balance_v2(trx(5), ResourceKind::Energy, &addr(1))
        .unwrap();
    assert_eq!(request.fields["unfreeze_balance"], json!(5_000_000));
    assert!(builder
        .unfreeze_balance_v2(Amount::ZERO, ResourceKind::Energy, &addr(1))
        .is_err());

    assert_eq!(
        "STORAGE".parse::<ResourceKind>().unwrap_err(),
        TransactionBuilderError::InvalidResourceKind("STORAGE".to_string())
    );
    assert_eq!(
        builder.withdraw_expire_unfreeze(&addr(1)).unwrap().path,
        "wallet/withdrawexpireunfreeze"
    );
    assert_eq!(
        builder.cancel_unfreeze_balance_v2(&addr(1)).unwrap().path,
        "wallet/cancelallunfreezev2"
    );
}

#[test]
fn test_delegation() {
    let builder = TransactionBuilder::new();
    let request = builder
        .delegate_resource(trx(1), &addr(2), ResourceKind::Energy, &addr(1), true, Some(28_800))
        .unwrap();
    assert_eq!(request.fields["lock"], json!(true));
    assert_eq!(request.fields["lock_period"], json!(28_800));

    assert!(matches!(
        builder.delegate_resource(trx(1), &addr(1), ResourceKind::Energy, &addr(1), false, None),
        Err(TransactionBuilderError::InvalidOption { .. })
    ));
    assert!(matches!(
        builder.delegate_resource(trx(1), &addr(2), ResourceKind::Energy, &addr(1), false, Some(10)),
        Err(TransactionBuilderError::InvalidDuration(_))
    ));
    assert!(matches!(
        builder.delegate_resource(trx(1), &addr(2), ResourceKind::Energy, &addr(1), true, Some(0)),
        Err(TransactionBuilderError::InvalidDuration(_))
    ));
    assert!(builder
        .undelegate_resource(trx(1), &addr(1), ResourceKind::Bandwidth, &addr(1))
        .is_err());
    assert!(builder
        .undelegate_resource(trx(1), &addr(2), ResourceKind::Bandwidth, &addr(1))
        .is_ok());
}

#[test]
fn test_accounts_and_votes() {
    let builder = TransactionBuilder::new();
    assert!(builder.create_account(&addr(1), &addr(1)).is_err());
    assert_eq!(
        builder.create_account(&addr(2), &addr(1)).unwrap().fields["account_address"],
        json!(addr(2).to_hex())
    );
    assert_eq!(
        builder.update_account("alice", &addr(1)).unwrap().fields["account_name"],
        json!("616c696365")
    );
    assert!(builder.update_account("", &addr(1)).is_err());

    let request = builder
        .vote(&[(addr(7), 10), (addr(8), 5)], &addr(1))
        .unwrap();
    assert_eq!(
        request.fields["votes"],
        json!([
            {"vote_address": addr(7).to_hex(), "vote_count": 10},
            {"vote_address": addr(8).to_hex(), "vote_count": 5}
        ])
    );
    assert!(builder.vote(&[], &addr(1)).is_err());
    assert!(builder.vote(&[(addr(7), 0)], &addr(1)).is_err());
    assert!(builder.vote(&[(addr(7), 1), (addr(7), 2)], &addr(1)).is_err());
    assert_eq!(
        builder.withdraw_block_rewards(&addr(1)).unwrap().path,
        "wallet/withdrawbalance"
    );
}

#[test]
fn test_trigger_smart_contract() {
    let builder = TransactionBuilder::new();
    let request = builder
        .trigger_smart_contract(
            &addr(9),
            "transfer(address,uint256)",
            &[addr(2).into(), U256::from(1_000_000).into()],
            &CallOptions::default(),
            &addr(1),
        )
        .unwrap();
    assert_eq!(request.path, "wallet/triggersmartcontract");
    assert_eq!(request.fields["function_selector"], json!("transfer(address,uint256)"));
    assert_eq!(request.fields["fee_limit"], json!(150_000_000));
    assert_eq!(request.fields["call_value"], json!(0));
    let parameter = request.fields["parameter"].as_str().unwrap();
    assert_eq!(parameter.len(), 128);
    assert!(parameter.ends_with("0f4240"));

    let request = builder
        .trigger_constant_contract(&addr(9), "balanceOf(address)", &[addr(2).into()], &addr(1))
        .unwrap();
    assert_eq!(request.kind, RequestKind::Read);
    assert!(!request.fields.contains_key("fee_limit"));
}

#[test]
fn test_trigger_validation() {
    let builder = TransactionBuilder::new();
    let call = |options: CallOptions| {
        builder.trigger_smart_contract(
            &addr(9),
            "approve(address,uint256)",
            &[addr(2).into(), U256::from(1).into()],
            &options,
            &addr(1),
        )
    };
    assert_eq!(
        call(CallOptions { fee_limit: Some(2_000_000_000), ..Default::default() }).unwrap_err(),
        TransactionBuilderError::FeeLimitExceeded { fee_limit: 2_000_000_000, max: 1_000_000_000 }
    );
    assert!(matches!(
        call(CallOptions { token_value: Some(5), ..Default::default() }),
        Err(TransactionBuilderError::InvalidOption { .. })
    ));
    assert!(call(CallOptions {
        token_id: Some(1_002_000),
        token_value: Some(5),
        ..Default::default()
    })
    .is_ok());
    assert!(matches!(
        builder.trigger_smart_contract(
            &addr(9),
            "approve(address,uint256)",
            &[addr(2).into()],
            &CallOptions::default(),
            &addr(1),
        ),
        Err(TransactionBuilderError::Abi(AbiError::ArityMismatch { .. }))
    ));
    assert!(matches!(
        builder.trigger_smart_contract(
            &addr(9),
            "approve(address,uint7)",
            &[],
            &CallOptions::default(),
            &addr(1),
        ),
        Err(TransactionBuilderError::Abi(AbiError::UnsupportedAbiType(_)))
    ));
}

fn deploy(abi: &str) -> DeployOptions {
    DeployOptions {
        abi: abi.to_string(),
        bytecode: vec![0x60, 0x80, 0x60, 0x40],
        name: "Vault".to_string(),
        origin_energy_limit: 1_000_000,
        user_fee_percentage: 30,
        ..Default::default()
    }
}

#[test]
fn test_create_smart_contract() {
    let builder = TransactionBuilder::new();
    let options = DeployOptions {
        parameters: vec![AbiValue::Address(addr(1))],
        call_value: trx(1),
        ..deploy(PAYABLE_ABI)
    };
    let request = builder.create_smart_contract(&options, &addr(1)).unwrap();
    assert_eq!(request.path, "wallet/deploycontract");
    assert_eq!(request.fields["bytecode"], json!("60806040"));
    assert_eq!(request.fields["consume_user_resource_percent"], json!(30));
    assert_eq!(
        request.fields["parameter"],
        json!(format!("{:0>64}", &addr(1).to_hex()[2..]))
    );

    assert!(builder.create_smart_contract(&deploy(PLAIN_ABI), &addr(1)).is_ok());
}

#[test]
fn test_create_smart_contract_validation() {
    let builder = TransactionBuilder::new();
    let payable = DeployOptions {
        parameters: vec![AbiValue::Address(addr(1))],
        ..deploy(PAYABLE_ABI)
    };
    assert!(matches!(
        builder.create_smart_contract(&payable, &addr(1)),
        Err(TransactionBuilderError::PayableMismatch(_))
    ));
    assert!(matches!(
        builder.create_smart_contract(
            &DeployOptions { call_value: trx(1), ..deploy(PLAIN_ABI) },
            &addr(1)
        ),
        Err(TransactionBuilderError::PayableMismatch(_))
    ));
    for options in [
        DeployOptions { user_fee_percentage: 101, ..deploy(PLAIN_ABI) },
        DeployOptions { origin_energy_limit: 0, ..deploy(PLAIN_ABI) },
        DeployOptions { origin_energy_limit: 10_000_001, ..deploy(PLAIN_ABI) },
        DeployOptions { bytecode: vec![], ..deploy(PLAIN_ABI) },
    ] {
        assert!(matches!(
            builder.create_smart_contract(&options, &addr(1)),
            Err(TransactionBuilderError::InvalidOption { .. })
        ));
    }
    assert!(matches!(
        builder.create_smart_contract(
            &DeployOptions { fee_limit: Some(1_000_000_001), ..deploy(PLAIN_ABI) },
            &addr(1)
        ),
        Err(TransactionBuilderError::FeeLimitExceeded { .. })
    ));
    assert!(matches!(
        builder.create_smart_contract(
            &DeployOptions { parameters: vec![true.into()], ..deploy(PLAIN_ABI) },
            &addr(1)
        ),
        Err(TransactionBuilderError::Abi(AbiError::ArityMismatch { .. }))
    ));
}

#[test]
fn test_permission_id() {
    let request = TransactionBuilder::new()
        .permission_id(2)
        .send_trx(&addr(2), trx(1), &addr(1))
        .unwrap();
    assert_eq!(request.fields["Permission_id"], json!(2));
}
