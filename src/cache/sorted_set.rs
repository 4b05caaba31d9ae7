use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Member → integer score, iterable highest score first.
///
/// Equal scores are ordered by the most recent update first.
#[derive(Debug, Default, Clone)]
pub(crate) struct SortedSet {
    members: HashMap<String, (i64, u64)>,
    ranking: BTreeSet<(Reverse<i64>, Reverse<u64>, String)>,
    clock: u64,
}

impl SortedSet {
    pub(crate) fn incr_by(&mut self, member: &str, delta: i64) -> i64 {
        self.clock += 1;
        let score = match self.members.get(member) {
            Some(&(score, touched)) => {
                self.ranking
                    .remove(&(Reverse(score), Reverse(touched), member.to_string()));
                score + delta
            }
            None => delta,
        };

        self.members.insert(member.to_string(), (score, self.clock));
        self.ranking
            .insert((Reverse(score), Reverse(self.clock), member.to_string()));
        score
    }

    pub(crate) fn score(&self, member: &str) -> Option<i64> {
        self.members.get(member).map(|&(score, _)| score)
    }

    pub(crate) fn top(&self, limit: usize) -> Vec<(String, i64)> {
        self.ranking
            .iter()
            .take(limit)
            .map(|(Reverse(score), _, member)| (member.clone(), *score))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }
}
