/// A module containing the per-bag state of the dynamic program and its
/// canonical encoding. A state consists of the target degree of every bag
/// vertex (0, 1 or 2) and the list of endpoint pairs of the open paths the
/// subtree below the bag must produce. Degree vectors are packed into a
/// basis-3 integer function; endpoint pairs are kept sorted so that two
/// semantically equal states always hash to the same table key.
pub mod state_codec {
    use crate::graph_structures::graph_model::Vertex;
    use crate::integer_functions::integer_functions::{self, Mapping};

    /// Degrees live in {0, 1, 2}, so the packed degree vector is an integer
    /// function of basis 3.
    pub const DEGREE_BASIS: Mapping = 3;

    /// A canonical table key. Equality and hashing go over the packed degree
    /// vector and the canonicalised endpoint list, so two keys are equal
    /// exactly when the degree vectors match element-wise and the endpoint
    /// pair multisets match.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct State {
        degrees: Mapping,
        k: usize,
        endpoints: Vec<(Vertex, Vertex)>,
    }

    /// Brings an endpoint list into canonical form: every pair low id first,
    /// pairs ordered by (low id, high id). Order within a pair and between
    /// pairs carries no meaning, only the multiset does.
    pub fn canonicalize(endpoints: &[(Vertex, Vertex)]) -> Vec<(Vertex, Vertex)> {
        let mut pairs: Vec<(Vertex, Vertex)> = endpoints
            .iter()
            .map(|&(u, v)| if u.index() <= v.index() { (u, v) } else { (v, u) })
            .collect();
        pairs.sort_by_key(|&(u, v)| (u.index(), v.index()));
        pairs
    }

    impl State {
        /// Encodes a degree vector and an endpoint pair list. The degree
        /// entries must be at most 2; endpoint pairs refer to original-graph
        /// vertex ids, never to bag-local indices, so keys can be projected
        /// between bags with overlapping contents.
        pub fn encode(degrees: &[u8], endpoints: &[(Vertex, Vertex)]) -> State {
            debug_assert!(degrees.iter().all(|&d| d <= 2));
            debug_assert!(degrees.len() <= 40); // basis-3 digits of a u64

            let mut packed = 0;
            for (s, &d) in degrees.iter().enumerate() {
                packed =
                    integer_functions::extend(DEGREE_BASIS, packed, s as Mapping, Mapping::from(d));
            }
            State {
                degrees: packed,
                k: degrees.len(),
                endpoints: canonicalize(endpoints),
            }
        }

        /// Unpacks the degree vector, index i holding the degree owed by the
        /// i-th bag content.
        pub fn decode_degrees(&self) -> Vec<u8> {
            integer_functions::to_vec(DEGREE_BASIS, self.degrees, self.k)
                .into_iter()
                .map(|d| d as u8)
                .collect()
        }

        /// The canonicalised endpoint pairs.
        pub fn endpoints(&self) -> &[(Vertex, Vertex)] {
            &self.endpoints
        }

        /// The number of bag vertices this state describes.
        pub fn len(&self) -> usize {
            self.k
        }

        pub fn is_empty(&self) -> bool {
            self.k == 0
        }
    }
}
