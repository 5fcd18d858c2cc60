use alloy_primitives::{Address, B256, U256};
use serde_json::json;
use typed_data::address::checksum_address;
use typed_data::{encode, encode_hash, FieldDecl, TypedData, DOMAIN_TYPE};

use crate::error::SafeTxError;
use crate::signature::{join_sorted, parse_signatures, SafeSignature, SignatureKind};
use crate::signing::sign_hash;
use crate::version::SafeVersion;

const SAFE_TX_TYPE: &str = "SafeTx";

/// A Safe multisig transaction as its owners sign it.
///
/// `signatures` holds the concatenated owner signatures in the layout the
/// Safe contract's `execTransaction` expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeTx {
    pub safe_address: Address,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub operation: u8,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
    pub version: SafeVersion,
    pub chain_id: Option<u64>,
    pub signatures: Vec<u8>,
}

impl SafeTx {
    /// A zero-value call to the zero address with no gas refund settings.
    pub fn new(safe_address: Address, version: SafeVersion) -> Self {
        SafeTx {
            safe_address,
            to: Address::ZERO,
            value: U256::ZERO,
            data: Vec::new(),
            operation: 0,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce: U256::ZERO,
            version,
            chain_id: None,
            signatures: Vec::new(),
        }
    }

    pub fn with_call(mut self, to: Address, value: U256, data: Vec<u8>, operation: u8) -> Self {
        self.to = to;
        self.value = value;
        self.data = data;
        self.operation = operation;
        self
    }

    pub fn with_gas(mut self, safe_tx_gas: U256, base_gas: U256, gas_price: U256) -> Self {
        self.safe_tx_gas = safe_tx_gas;
        self.base_gas = base_gas;
        self.gas_price = gas_price;
        self
    }

    pub fn with_refund(mut self, gas_token: Address, refund_receiver: Address) -> Self {
        self.gas_token = gas_token;
        self.refund_receiver = refund_receiver;
        self
    }

    pub fn with_nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_signatures(mut self, signatures: Vec<u8>) -> Self {
        self.signatures = signatures;
        self
    }

    /// The `SafeTx` typed data for this transaction's Safe version.
    pub fn eip712_payload(&self) -> Result<TypedData, SafeTxError> {
        let base_gas_field = self.version.base_gas_field();

        let mut domain_fields = Vec::with_capacity(2);
        let mut domain = serde_json::Map::new();
        if self.version.domain_has_chain_id() {
            let chain_id = self
                .chain_id
                .ok_or_else(|| SafeTxError::MissingChainId(self.version.to_string()))?;
            domain_fields.push(FieldDecl::new("chainId", "uint256"));
            domain.insert("chainId".into(), json!(chain_id));
        }
        domain_fields.push(FieldDecl::new("verifyingContract", "address"));
        domain.insert(
            "verifyingContract".into(),
            json!(checksum_address(&self.safe_address)),
        );

        let safe_tx_fields = vec![
            FieldDecl::new("to", "address"),
            FieldDecl::new("value", "uint256"),
            FieldDecl::new("data", "bytes"),
            FieldDecl::new("operation", "uint8"),
            FieldDecl::new("safeTxGas", "uint256"),
            FieldDecl::new(base_gas_field, "uint256"),
            FieldDecl::new("gasPrice", "uint256"),
            FieldDecl::new("gasToken", "address"),
            FieldDecl::new("refundReceiver", "address"),
            FieldDecl::new("nonce", "uint256"),
        ];

        let mut message = serde_json::Map::new();
        message.insert("to".into(), json!(checksum_address(&self.to)));
        message.insert("value".into(), json!(self.value.to_string()));
        message.insert("data".into(), json!(format!("0x{}", hex::encode(&self.data))));
        message.insert("operation".into(), json!(self.operation));
        message.insert("safeTxGas".into(), json!(self.safe_tx_gas.to_string()));
        message.insert(base_gas_field.into(), json!(self.base_gas.to_string()));
        message.insert("gasPrice".into(), json!(self.gas_price.to_string()));
        message.insert("gasToken".into(), json!(checksum_address(&self.gas_token)));
        message.insert(
            "refundReceiver".into(),
            json!(checksum_address(&self.refund_receiver)),
        );
        message.insert("nonce".into(), json!(self.nonce.to_string()));

        Ok(TypedData {
            types: [
                (DOMAIN_TYPE.to_string(), domain_fields),
                (SAFE_TX_TYPE.to_string(), safe_tx_fields),
            ]
            .into_iter()
            .collect(),
            primary_type: SAFE_TX_TYPE.to_string(),
            domain: domain.into(),
            message: message.into(),
        })
    }

    /// The 66-byte EIP-712 preimage of [`SafeTx::safe_tx_hash`].
    pub fn safe_tx_hash_preimage(&self) -> Result<Vec<u8>, SafeTxError> {
        Ok(encode(&self.eip712_payload()?)?)
    }

    /// The hash owners sign and the Safe contract checks on execution.
    pub fn safe_tx_hash(&self) -> Result<B256, SafeTxError> {
        let hash = encode_hash(&self.eip712_payload()?)?;
        tracing::debug!(
            safe = %self.safe_address,
            nonce = %self.nonce,
            version = %self.version,
            safe_tx_hash = %hash,
            "computed safe tx hash"
        );
        Ok(hash)
    }

    /// Signs the transaction as an owner and merges the signature in,
    /// keeping entries ordered by owner address. A previous signature by
    /// the same owner is replaced.
    pub fn sign(&mut self, private_key: &[u8; 32]) -> Result<[u8; 65], SafeTxError> {
        let hash = self.safe_tx_hash()?;
        let signature = sign_hash(&hash, private_key)?;
        let signed = SafeSignature::parse(signature, &hash)?;

        let mut entries = self.owner_signatures(&hash)?;
        entries.retain(|s| s.owner != signed.owner);
        tracing::debug!(owner = %signed.owner, "added owner signature");
        entries.push(signed);

        self.signatures = join_sorted(entries);
        Ok(signature)
    }

    /// Owners of the attached signatures, in blob order.
    pub fn signers(&self) -> Result<Vec<Address>, SafeTxError> {
        let hash = self.safe_tx_hash()?;
        Ok(parse_signatures(&self.signatures, &hash)?
            .into_iter()
            .map(|s| s.owner)
            .collect())
    }

    pub fn sorted_signers(&self) -> Result<Vec<Address>, SafeTxError> {
        let mut signers = self.signers()?;
        signers.sort();
        Ok(signers)
    }

    /// Removes the signature of `owner`. Returns whether one was present.
    pub fn unsign(&mut self, owner: Address) -> Result<bool, SafeTxError> {
        let hash = self.safe_tx_hash()?;
        let mut entries = self.owner_signatures(&hash)?;
        let before = entries.len();
        entries.retain(|s| s.owner != owner);

        if entries.len() == before {
            return Ok(false);
        }
        self.signatures = join_sorted(entries);
        Ok(true)
    }

    // Contract signatures carry dynamic data after the static part, so the
    // blob cannot be re-sorted entry by entry while one is present.
    fn owner_signatures(&self, hash: &B256) -> Result<Vec<SafeSignature>, SafeTxError> {
        let entries = parse_signatures(&self.signatures, hash)?;
        if entries.iter().any(|s| s.kind == SignatureKind::Contract) {
            return Err(SafeTxError::InvalidSignature(
                "cannot rewrite signatures that include a contract signature".into(),
            ));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::address_from_private_key;
    use alloy_primitives::address;

    fn hex_hash(hash: B256) -> String {
        format!("0x{}", hex::encode(hash))
    }

    fn key(n: u8) -> [u8; 32] {
        let mut privkey = [0u8; 32];
        privkey[31] = n;
        privkey
    }

    fn simple_tx(version: &str) -> SafeTx {
        SafeTx::new(
            address!("692a70D2e424a56D2C6C27aA97D1a86395877b3A"),
            version.parse().unwrap(),
        )
        .with_call(
            address!("5AC255889882aaB35A2aa939679E3F3d4Cea221E"),
            U256::from(5_000_000u64),
            vec![0x00],
            0,
        )
        .with_gas(U256::from(50_000u64), U256::from(100u64), U256::from(10_000u64))
        .with_nonce(U256::from(67u64))
    }

    fn create_tx(version: &str) -> SafeTx {
        SafeTx::new(
            address!("692a70D2e424a56D2C6C27aA97D1a86395877b3A"),
            version.parse().unwrap(),
        )
        .with_call(
            Address::ZERO,
            U256::from(80_000_000u64),
            vec![0x56, 0x29, 0x44],
            2,
        )
        .with_gas(U256::from(54_522u64), U256::from(773u64), U256::from(22_000_000u64))
        .with_nonce(U256::from(257_000u64))
    }

    fn v130_tx() -> SafeTx {
        SafeTx::new(
            address!("2B0b9cBDA3D7b0F760187c52A8FFB18C48E5d96A"),
            SafeVersion::V1_3_0,
        )
        .with_call(
            address!("79613FD49472C3C7a32188e45ff00e7bdC8a897d"),
            U256::from(2u64),
            vec![0x12, 0x12],
            0,
        )
        .with_refund(
            address!("FA995c7a0d32A4e7497508a5C380369BE8dB49Db"),
            address!("6b92f5E5360bfCa8F5d3FcE65D87382967847983"),
        )
        .with_nonce(U256::from(17u64))
        .with_chain_id(4)
    }

    #[test]
    fn hash_v0_1_0() {
        assert_eq!(
            hex_hash(simple_tx("0.1.0").safe_tx_hash().unwrap()),
            "0xc9d69a2350aede7978fdee58e702647e4bbdc82168577aa4a43b66ad815c6d1a"
        );
        assert_eq!(
            hex_hash(create_tx("0.1.0").safe_tx_hash().unwrap()),
            "0x8ca8db91d72b379193f6e229eb2dff0d0621b6ef452d90638ee3206e9b7349b3"
        );
    }

    #[test]
    fn hash_v1_0_0() {
        assert_eq!(
            hex_hash(simple_tx("1.0.0").safe_tx_hash().unwrap()),
            "0x7c60341f3e1b4483575f38e84e97d6b332a2dd55b9290f39e6e26eef29a04fe7"
        );
        assert_eq!(
            hex_hash(create_tx("1.0.0").safe_tx_hash().unwrap()),
            "0xf585279fd867c94738096f4eab964e9e202014d2f0d5155d751099ad85cbe504"
        );
    }

    #[test]
    fn hash_v1_3_0_binds_chain_id() {
        assert_eq!(
            hex_hash(v130_tx().safe_tx_hash().unwrap()),
            "0x01d42a801ac44d3ebd43592be980dea0756d7f7b27d718d3016a42ea7ce85587"
        );

        let other_chain = v130_tx().with_chain_id(1).safe_tx_hash().unwrap();
        assert_ne!(hex_hash(other_chain), hex_hash(v130_tx().safe_tx_hash().unwrap()));
    }

    #[test]
    fn l2_build_tag_hashes_like_base_version() {
        let mut tx = v130_tx();
        tx.version = "1.3.0+L2".parse().unwrap();
        assert_eq!(tx.safe_tx_hash().unwrap(), v130_tx().safe_tx_hash().unwrap());
    }

    #[test]
    fn v1_3_0_without_chain_id_is_rejected() {
        let mut tx = v130_tx();
        tx.chain_id = None;
        assert!(matches!(
            tx.safe_tx_hash(),
            Err(SafeTxError::MissingChainId(v)) if v == "1.3.0"
        ));
    }

    #[test]
    fn payload_shape_follows_version() {
        let old = simple_tx("0.1.0").eip712_payload().unwrap();
        assert!(old.types["SafeTx"].iter().any(|f| f.name == "dataGas"));
        assert_eq!(old.types[DOMAIN_TYPE].len(), 1);

        let new = v130_tx().eip712_payload().unwrap();
        assert!(new.types["SafeTx"].iter().any(|f| f.name == "baseGas"));
        assert_eq!(new.types[DOMAIN_TYPE][0].name, "chainId");
        assert_eq!(new.message["data"], "0x1212");
    }

    #[test]
    fn preimage_hashes_to_safe_tx_hash() {
        use sha3::{Digest, Keccak256};

        let tx = v130_tx();
        let preimage = tx.safe_tx_hash_preimage().unwrap();
        assert_eq!(preimage.len(), 66);
        assert_eq!(
            B256::from_slice(&Keccak256::digest(&preimage)),
            tx.safe_tx_hash().unwrap()
        );
    }

    #[test]
    fn sign_keeps_signatures_sorted_by_owner() {
        let mut tx = v130_tx();
        for n in [3u8, 1, 2] {
            tx.sign(&key(n)).unwrap();
        }

        assert_eq!(tx.signatures.len(), 65 * 3);
        let signers = tx.signers().unwrap();
        assert_eq!(signers, tx.sorted_signers().unwrap());

        let mut expected: Vec<Address> = [1u8, 2, 3]
            .iter()
            .map(|n| address_from_private_key(&key(*n)).unwrap())
            .collect();
        expected.sort();
        assert_eq!(signers, expected);
    }

    #[test]
    fn signing_twice_replaces_previous_signature() {
        let mut tx = v130_tx();
        tx.sign(&key(1)).unwrap();
        tx.sign(&key(1)).unwrap();
        assert_eq!(tx.signers().unwrap().len(), 1);
    }

    #[test]
    fn unsign_removes_only_that_owner() {
        let mut tx = v130_tx();
        tx.sign(&key(1)).unwrap();
        tx.sign(&key(2)).unwrap();

        let owner1 = address_from_private_key(&key(1)).unwrap();
        let owner2 = address_from_private_key(&key(2)).unwrap();

        assert!(tx.unsign(owner1).unwrap());
        assert!(!tx.unsign(owner1).unwrap());
        assert_eq!(tx.signers().unwrap(), vec![owner2]);
    }

    #[test]
    fn contract_signatures_block_rewrites() {
        let mut contract = [0u8; 65];
        contract[63] = 65;
        let mut blob = contract.to_vec();
        blob.extend_from_slice(&[0u8; 32]);

        let mut tx = v130_tx().with_signatures(blob);
        assert_eq!(tx.signers().unwrap(), vec![Address::ZERO]);
        assert!(matches!(
            tx.sign(&key(1)),
            Err(SafeTxError::InvalidSignature(_))
        ));
    }
}
