//! The dispersal table: which two pieces each server stores.
//!
//! Indexed by content-hash residue and server index. Every residue row
//! places each piece id on exactly two servers, and any three servers
//! together hold all four ids, so the scheme tolerates one server loss.

use dfp_core::{MOD_COUNT, PIECES_PER_SERVER, SERVER_COUNT};

/// `PIECE_PLACEMENT[mod][server]` = the two piece ids that server stores.
pub const PIECE_PLACEMENT: [[[u8; PIECES_PER_SERVER]; SERVER_COUNT]; MOD_COUNT] = [
    [[1, 2], [2, 3], [3, 4], [4, 1]],
    [[4, 1], [1, 2], [2, 3], [3, 4]],
    [[3, 4], [4, 1], [1, 2], [2, 3]],
    [[2, 3], [3, 4], [4, 1], [1, 2]],
];

/// The two piece ids `server` stores for residue `residue`.
///
/// # Panics
/// Panics when `residue` or `server` is outside the table; both are
/// produced by this crate and bounded by construction.
#[must_use]
pub const fn pieces_for_server(residue: u8, server: usize) -> [u8; PIECES_PER_SERVER] {
    PIECE_PLACEMENT[residue as usize][server]
}

/// Outcome of inferring the placement residue from observed reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModInference {
    /// Exactly one residue is consistent with every observation.
    Unique(u8),
    /// More than one residue fits the observations.
    Ambiguous,
    /// No observation, or no residue fits them all.
    Unknown,
}

/// Infer the residue from `(server index, piece id pair)` observations.
///
/// Pairs are unordered; a residue qualifies only when it is consistent
/// with every observation. A single well-formed pair is always enough:
/// each server column cycles through all four pairs across the residues.
#[must_use]
pub fn infer_mod(observations: &[(usize, [u8; PIECES_PER_SERVER])]) -> ModInference {
    if observations.is_empty() {
        return ModInference::Unknown;
    }

    let matches = |residue: usize| {
        observations.iter().all(|&(server, observed)| {
            if server >= SERVER_COUNT {
                return false;
            }
            let expected = PIECE_PLACEMENT[residue][server];
            observed == expected || observed == [expected[1], expected[0]]
        })
    };

    let mut candidates = (0..MOD_COUNT).filter(|&m| matches(m));
    match (candidates.next(), candidates.next()) {
        #[allow(clippy::cast_possible_truncation)]
        (Some(residue), None) => ModInference::Unique(residue as u8),
        (Some(_), Some(_)) => ModInference::Ambiguous,
        (None, _) => ModInference::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfp_core::PIECE_COUNT;

    #[test]
    fn every_row_covers_all_pieces_twice() {
        for row in &PIECE_PLACEMENT {
            let mut copies = [0usize; PIECE_COUNT];
            for server in row {
                for &id in server {
                    copies[(id - 1) as usize] += 1;
                }
            }
            assert_eq!(copies, [2; PIECE_COUNT]);
        }
    }

    #[test]
    fn any_three_servers_cover_all_pieces() {
        for row in &PIECE_PLACEMENT {
            for dropped in 0..SERVER_COUNT {
                let mut present = [false; PIECE_COUNT];
                for (server, ids) in row.iter().enumerate() {
                    if server == dropped {
                        continue;
                    }
                    for &id in ids {
                        present[(id - 1) as usize] = true;
                    }
                }
                assert_eq!(present, [true; PIECE_COUNT]);
            }
        }
    }

    #[test]
    fn mod_one_row_matches_the_contract() {
        assert_eq!(pieces_for_server(1, 0), [4, 1]);
        assert_eq!(pieces_for_server(1, 1), [1, 2]);
        assert_eq!(pieces_for_server(1, 2), [2, 3]);
        assert_eq!(pieces_for_server(1, 3), [3, 4]);
    }

    #[test]
    fn single_pair_infers_uniquely() {
        for residue in 0..MOD_COUNT {
            for server in 0..SERVER_COUNT {
                let pair = PIECE_PLACEMENT[residue][server];
                #[allow(clippy::cast_possible_truncation)]
                let expected = ModInference::Unique(residue as u8);
                assert_eq!(infer_mod(&[(server, pair)]), expected);
                // Order within the pair does not matter.
                assert_eq!(infer_mod(&[(server, [pair[1], pair[0]])]), expected);
            }
        }
    }

    #[test]
    fn consistent_observations_agree() {
        let obs = [(0usize, [4, 1]), (2, [2, 3]), (3, [3, 4])];
        assert_eq!(infer_mod(&obs), ModInference::Unique(1));
    }

    #[test]
    fn inconsistent_observations_are_unknown() {
        // Server 0 pair from mod 0, server 1 pair from mod 2.
        let obs = [(0usize, [1, 2]), (1, [4, 1])];
        assert_eq!(infer_mod(&obs), ModInference::Unknown);
    }

    #[test]
    fn no_observations_is_unknown() {
        assert_eq!(infer_mod(&[]), ModInference::Unknown);
    }
}
