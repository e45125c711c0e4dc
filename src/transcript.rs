//! Fiat-Shamir transcript
//!
//! The prover "sends" commitments, evaluations and integers to the
//! verifier by appending them here; every element is absorbed into a
//! running SHA-256 state and challenges are squeezed from it. Sent
//! elements are also kept, in order, so callers can read them back.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::curve::G1Affine;
use crate::field::Fr;

/// Anything that can be sent to the verifier.
pub trait TranscriptElement {
    const TYPE_NAME: &'static str;

    fn to_transcript_bytes(&self) -> Vec<u8>;

    fn into_value(self) -> TranscriptValue;
}

impl TranscriptElement for Fr {
    const TYPE_NAME: &'static str = "Fr";

    fn to_transcript_bytes(&self) -> Vec<u8> {
        self.to_bytes_be().to_vec()
    }

    fn into_value(self) -> TranscriptValue {
        TranscriptValue::Field(self)
    }
}

impl TranscriptElement for G1Affine {
    const TYPE_NAME: &'static str = "G1";

    fn to_transcript_bytes(&self) -> Vec<u8> {
        self.to_compressed_bytes()
    }

    fn into_value(self) -> TranscriptValue {
        TranscriptValue::Commitment(self)
    }
}

impl TranscriptElement for u64 {
    const TYPE_NAME: &'static str = "u64";

    fn to_transcript_bytes(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }

    fn into_value(self) -> TranscriptValue {
        TranscriptValue::Integer(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptValue {
    Field(Fr),
    Commitment(G1Affine),
    Integer(u64),
}

/// One element sent to the verifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub label: String,
    pub data_type: String,
    pub data_hex: String,
    pub value: TranscriptValue,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub label: String,
    pub value: Fr,
}

#[derive(Clone, Debug)]
pub struct Transcript {
    hasher: Sha256,
    domain_separator: String,
    entries: Vec<TranscriptEntry>,
    challenges: Vec<ChallengeRecord>,
}

impl Transcript {
    pub fn new(domain_separator: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain_separator);
        Transcript {
            hasher,
            domain_separator: hex::encode(domain_separator),
            entries: Vec::new(),
            challenges: Vec::new(),
        }
    }

    /// Append `value` under `label` and absorb it.
    pub fn send_to_verifier<T: TranscriptElement + Clone>(&mut self, label: &str, value: &T) {
        let bytes = value.to_transcript_bytes();
        self.hasher.update(label.as_bytes());
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(&bytes);

        self.entries.push(TranscriptEntry {
            label: label.to_string(),
            data_type: T::TYPE_NAME.to_string(),
            data_hex: hex::encode(&bytes),
            value: value.clone().into_value(),
        });
    }

    /// Squeeze a challenge; the digest is chained back into the state.
    pub fn squeeze_challenge(&mut self, label: &str) -> Fr {
        self.hasher.update(label.as_bytes());
        let hash = self.hasher.finalize_reset();
        self.hasher.update(hash);

        let challenge = hash_to_fr(hash.into());
        self.challenges.push(ChallengeRecord {
            label: label.to_string(),
            value: challenge,
        });
        challenge
    }

    /// Squeeze until the challenge lies outside the size-n subgroup.
    pub fn squeeze_challenge_outside_domain(&mut self, label: &str, n: usize) -> Fr {
        loop {
            let challenge = self.squeeze_challenge(label);
            if !challenge.pow(n as u64).is_one() {
                return challenge;
            }
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn challenges(&self) -> &[ChallengeRecord] {
        &self.challenges
    }

    /// Most recent commitment sent under `label`.
    pub fn get_commitment(&self, label: &str) -> Option<G1Affine> {
        self.entries.iter().rev().find_map(|entry| match &entry.value {
            TranscriptValue::Commitment(point) if entry.label == label => Some(*point),
            _ => None,
        })
    }

    /// Most recent field element sent under `label`.
    pub fn get_field_element(&self, label: &str) -> Option<Fr> {
        self.entries.iter().rev().find_map(|entry| match &entry.value {
            TranscriptValue::Field(value) if entry.label == label => Some(*value),
            _ => None,
        })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}

/// Reduce a 32-byte digest into Fr, rehashing on the rare overflow.
fn hash_to_fr(mut bytes: [u8; 32]) -> Fr {
    loop {
        if let Some(fr) = Fr::from_bytes_be(&bytes) {
            return fr;
        }
        bytes = Sha256::digest(bytes).into();
    }
}

impl Serialize for Transcript {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct TranscriptJson<'a> {
            domain_separator: &'a str,
            entries: &'a [TranscriptEntry],
            challenges: &'a [ChallengeRecord],
        }

        TranscriptJson {
            domain_separator: &self.domain_separator,
            entries: &self.entries,
            challenges: &self.challenges,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_deterministic() {
        let mut t1 = Transcript::new(b"test");
        let mut t2 = Transcript::new(b"test");

        t1.send_to_verifier("value", &Fr::from_u64(42));
        t2.send_to_verifier("value", &Fr::from_u64(42));

        assert_eq!(t1.squeeze_challenge("challenge"), t2.squeeze_challenge("challenge"));
    }

    #[test]
    fn test_transcript_different_input() {
        let mut t1 = Transcript::new(b"test");
        let mut t2 = Transcript::new(b"test");

        t1.send_to_verifier("value", &Fr::from_u64(42));
        t2.send_to_verifier("value", &Fr::from_u64(43));

        assert_ne!(t1.squeeze_challenge("challenge"), t2.squeeze_challenge("challenge"));
    }

    #[test]
    fn test_entries_keep_call_order() {
        let mut t = Transcript::new(b"test");
        let g = G1Affine::generator();
        t.send_to_verifier("circuit_size", &8u64);
        t.send_to_verifier("W_1", &g);
        t.send_to_verifier("a_eval", &Fr::from_u64(3));

        assert_eq!(t.labels(), vec!["circuit_size", "W_1", "a_eval"]);
        assert_eq!(t.entries()[0].data_type, "u64");
        assert_eq!(t.get_commitment("W_1"), Some(g));
        assert_eq!(t.get_commitment("a_eval"), None);
        assert_eq!(t.get_field_element("a_eval"), Some(Fr::from_u64(3)));
    }

    #[test]
    fn test_challenge_outside_domain() {
        let n = 8;
        let mut t = Transcript::new(b"test");
        for i in 0..50u64 {
            t.send_to_verifier("iter", &i);
            let c = t.squeeze_challenge_outside_domain("challenge", n);
            assert!(!c.pow(n as u64).is_one());
        }
        assert!(t.challenges().len() >= 50);
    }
}
