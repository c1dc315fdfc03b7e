//! Sequence-point queries used by the debugger agent.
//!
//! All queries resolve the method's blob through [`Domain::get_seq_points`], including the
//! generic fallbacks, and then search it. A method without a blob and a blob without a
//! matching point both yield `None`.

use std::sync::Arc;

use crate::{
    metadata::MethodKey,
    runtime::Domain,
    seqpoints::{PointId, SeqPointEntry, SeqPointInfo, SequencePoint},
};

/// A point found by a query, together with the blob it was decoded from.
#[derive(Debug, Clone)]
pub struct SeqPointHit {
    /// The blob the point belongs to
    pub info: Arc<SeqPointInfo>,
    /// The decoded point
    pub entry: SeqPointEntry,
}

impl SeqPointHit {
    /// Returns the decoded point.
    #[must_use]
    pub fn point(&self) -> &SequencePoint {
        &self.entry.point
    }

    /// Returns the step-over successors of the point.
    #[must_use]
    pub fn next_ids(&self) -> Vec<PointId> {
        self.info.next_ids(&self.entry)
    }

    /// Returns the successors decoded to points, in stored order.
    #[must_use]
    pub fn next_points(&self) -> Vec<SeqPointEntry> {
        let ids = self.next_ids();
        if ids.is_empty() {
            return Vec::new();
        }

        let entries: Vec<SeqPointEntry> = self.info.iter().collect();
        ids.iter()
            .filter_map(|id| entries.get(id.index()).copied())
            .collect()
    }
}

/// Returns the blob registered for `method`.
#[must_use]
pub fn get_seq_points(domain: &Domain, method: &MethodKey) -> Option<Arc<SeqPointInfo>> {
    domain.get_seq_points(method)
}

fn search<F>(domain: &Domain, method: &MethodKey, find: F) -> Option<SeqPointHit>
where
    F: FnOnce(&SeqPointInfo) -> Option<SeqPointEntry>,
{
    let info = domain.get_seq_points(method)?;
    let entry = find(&info)?;
    Some(SeqPointHit { info, entry })
}

/// Returns the first point of `method` at `il_offset`.
#[must_use]
pub fn find_seq_point(domain: &Domain, method: &MethodKey, il_offset: i32) -> Option<SeqPointHit> {
    search(domain, method, |info| info.find_by_il_offset(il_offset))
}

/// Returns the first point of `method` at or after `native_offset`.
#[must_use]
pub fn find_next_seq_point_for_native_offset(
    domain: &Domain,
    method: &MethodKey,
    native_offset: i32,
) -> Option<SeqPointHit> {
    search(domain, method, |info| {
        info.find_next_by_native_offset(native_offset)
    })
}

/// Returns the last point of `method` at or before `native_offset`.
#[must_use]
pub fn find_prev_seq_point_for_native_offset(
    domain: &Domain,
    method: &MethodKey,
    native_offset: i32,
) -> Option<SeqPointHit> {
    search(domain, method, |info| {
        info.find_prev_by_native_offset(native_offset)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{Token, TypeArg},
        seqpoints::SeqPointInfoBuilder,
    };

    fn domain_with(method: MethodKey, points: &[(i32, i32, &[PointId])]) -> Domain {
        let domain = Domain::new(1, "query");
        let mut builder = SeqPointInfoBuilder::new(true);
        for (il, native, next) in points {
            builder.add_seq_point(&SequencePoint::new(*il, *native), next);
        }
        domain.register_seq_points(method, Arc::new(builder.finish()));
        domain
    }

    #[test]
    fn native_queries() {
        let method = MethodKey::new(Token::method_def(1));
        let domain = domain_with(method.clone(), &[(0, 10, &[]), (2, 20, &[]), (4, 30, &[])]);

        let next = find_next_seq_point_for_native_offset(&domain, &method, 15).unwrap();
        assert_eq!(next.point().native_offset, 20);
        let prev = find_prev_seq_point_for_native_offset(&domain, &method, 15).unwrap();
        assert_eq!(prev.point().native_offset, 10);
        assert!(find_next_seq_point_for_native_offset(&domain, &method, 31).is_none());
        assert!(find_prev_seq_point_for_native_offset(&domain, &method, 5).is_none());
    }

    #[test]
    fn missing_method_and_missing_point_are_none() {
        let method = MethodKey::new(Token::method_def(1));
        let domain = domain_with(method.clone(), &[(0, 0, &[])]);

        assert!(find_seq_point(&domain, &MethodKey::new(Token::method_def(2)), 0).is_none());
        assert!(find_seq_point(&domain, &method, 7).is_none());
        assert!(get_seq_points(&domain, &method).is_some());
    }

    #[test]
    fn hit_exposes_successors() {
        let method = MethodKey::new(Token::method_def(4));
        let domain = domain_with(
            method.clone(),
            &[(0, 0, &[PointId(2)]), (2, 4, &[]), (6, 8, &[PointId(1)])],
        );

        let hit = find_seq_point(&domain, &method, 0).unwrap();
        assert_eq!(hit.next_ids(), vec![PointId(2)]);
        let next = hit.next_points();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].point.il_offset, 6);
        assert!(find_seq_point(&domain, &method, 2).unwrap().next_points().is_empty());
    }

    #[test]
    fn queries_use_generic_fallback() {
        let token = Token::method_def(8);
        let domain = domain_with(MethodKey::inflated(token, vec![TypeArg::Canon]), &[(0, 16, &[])]);
        let instance = MethodKey::inflated(token, vec![TypeArg::Type(Token(0x0200_0004))]);

        let hit = find_seq_point(&domain, &instance, 0).unwrap();
        assert_eq!(hit.point().native_offset, 16);
    }
}
