const DEFAULT: usize = 384;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Turns chunk text into fixed-length vectors. Implementations must be
/// deterministic so re-ingesting unchanged input is reproducible.
pub trait Embedder {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;

    fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Signed feature-hashing embedder over word unigrams and bigrams.
///
/// Each token hashes to a bucket plus a sign bit, so colliding features
/// partially cancel instead of piling up. Not a learned model, but local,
/// deterministic, and good enough to exercise the full pipeline without a
/// model server.
#[derive(Debug, Clone, Copy)]
pub struct FeatureHashEmbedder {
    pub dimensions: usize,
}

impl Default for FeatureHashEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl Embedder for FeatureHashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];

        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|character: char| !character.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();

        for (position, token) in tokens.iter().enumerate() {
            let unigram = token_hash(token);
            accumulate(&mut vector, unigram);

            if let Some(next) = tokens.get(position + 1) {
                accumulate(&mut vector, unigram ^ token_hash(next).rotate_left(17));
            }
        }

        l2_normalize(&mut vector);
        vector
    }
}

fn token_hash(token: &str) -> u64 {
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    for byte in token.bytes() {
        state = state
            .wrapping_add(u64::from(byte))
            .wrapping_mul(0xbf58_476d_1ce4_e5b9);
        state ^= state >> 27;
    }
    state
}

fn accumulate(vector: &mut [f32], hash: u64) {
    let bucket = ((hash >> 1) % vector.len() as u64) as usize;
    let sign = if hash & 1 == 0 { 1.0 } else { -1.0 };
    vector[bucket] += sign;
}

fn l2_normalize(vector: &mut [f32]) {
    let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector {
            *value /= magnitude;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Embedder, FeatureHashEmbedder};

    #[test]
    fn embedding_is_deterministic() {
        let embedder = FeatureHashEmbedder::default();
        assert_eq!(
            embedder.embed("Hydraulic pressure and flow"),
            embedder.embed("Hydraulic pressure and flow")
        );
    }

    #[test]
    fn embedding_has_configured_length_and_unit_norm() {
        let embedder = FeatureHashEmbedder { dimensions: 32 };
        let vector = embedder.embed("pump seal maintenance");
        assert_eq!(vector.len(), 32);

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_embeds_to_the_zero_vector() {
        let embedder = FeatureHashEmbedder { dimensions: 16 };
        assert_eq!(embedder.embed("   \n "), vec![0f32; 16]);
    }

    #[test]
    fn distinct_texts_produce_distinct_vectors() {
        let embedder = FeatureHashEmbedder::default();
        assert_ne!(
            embedder.embed("hydraulic pump failure"),
            embedder.embed("scheduled valve inspection")
        );
    }

    #[test]
    fn word_order_changes_the_bigram_features() {
        let embedder = FeatureHashEmbedder::default();
        assert_ne!(
            embedder.embed("pressure drop"),
            embedder.embed("drop pressure")
        );
    }

    #[test]
    fn batch_embedding_is_one_to_one() {
        let embedder = FeatureHashEmbedder::default();
        let texts = ["first chunk", "second chunk", "third chunk"];
        let vectors = embedder.embed_batch(&texts);
        assert_eq!(vectors.len(), texts.len());
        assert_eq!(vectors[0], embedder.embed("first chunk"));
    }
}
