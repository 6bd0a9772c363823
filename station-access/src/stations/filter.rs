//! Station list filtering and ordering.

use std::collections::HashSet;

use crate::domain::Station;

/// Stations shown per page of the list view.
pub const PAGE_SIZE: usize = 12;

/// Stations at the top of the list whose status is prefetched.
pub const PREVIEW_COUNT: usize = 8;

/// User-controlled list filter.
#[derive(Debug, Clone, Default)]
pub struct StationFilter {
    /// Free-text query, matched against name and id.
    pub query: String,
    /// Only show favorited stations.
    pub favorites_only: bool,
}

impl StationFilter {
    /// Whether `station` matches the query text.
    ///
    /// Case-insensitive substring match on name or id. A blank query
    /// matches everything.
    pub fn matches_query(&self, station: &Station) -> bool {
        let q = self.query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        station.name.to_lowercase().contains(&q) || station.id.to_lowercase().contains(&q)
    }
}

/// Filter the station list and put favorites first.
///
/// The ordering is a stable partition: favorites keep their relative
/// order, and so do the rest.
pub fn filter_and_sort<'a>(
    stations: &'a [Station],
    filter: &StationFilter,
    favorites: &[String],
) -> Vec<&'a Station> {
    let favorite_ids: HashSet<&str> = favorites.iter().map(String::as_str).collect();

    let (favored, rest): (Vec<&Station>, Vec<&Station>) = stations
        .iter()
        .filter(|s| filter.matches_query(s))
        .filter(|s| !filter.favorites_only || favorite_ids.contains(s.id.as_str()))
        .partition(|s| favorite_ids.contains(s.id.as_str()));

    favored.into_iter().chain(rest).collect()
}

/// Favorite ids with no station in the current list.
pub fn unknown_favorites(stations: &[Station], favorites: &[String]) -> Vec<String> {
    let known: HashSet<&str> = stations.iter().map(|s| s.id.as_str()).collect();
    favorites
        .iter()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Number of stations to show, given the requested count and the total.
///
/// Defaults to one page; always a whole number of pages, capped at `total`.
pub fn visible_count(requested: Option<usize>, total: usize) -> usize {
    let pages = requested
        .map(|n| n.div_ceil(PAGE_SIZE).max(1))
        .unwrap_or(1);
    pages.saturating_mul(PAGE_SIZE).min(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn station(id: &str, name: &str) -> Station {
        Station::new(id, name, vec![])
    }

    fn ids(list: &[&Station]) -> Vec<String> {
        list.iter().map(|s| s.id.clone()).collect()
    }

    fn favs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn favorites_first() {
        let stations = vec![station("A", "Union Sq"), station("B", "Times Sq")];
        let result = filter_and_sort(&stations, &StationFilter::default(), &favs(&["B"]));
        assert_eq!(ids(&result), vec!["B", "A"]);
    }

    #[test]
    fn query_matches_name_or_id_case_insensitively() {
        let stations = vec![
            station("602", "14 St-Union Sq"),
            station("611", "Times Sq-42 St"),
            station("164", "34 St-Penn Station"),
        ];
        let filter = StationFilter {
            query: "  union ".into(),
            favorites_only: false,
        };
        assert_eq!(ids(&filter_and_sort(&stations, &filter, &[])), vec!["602"]);

        let filter = StationFilter {
            query: "16".into(),
            favorites_only: false,
        };
        assert_eq!(ids(&filter_and_sort(&stations, &filter, &[])), vec!["164"]);
    }

    #[test]
    fn favorites_only_restricts() {
        let stations = vec![station("A", "Union Sq"), station("B", "Times Sq")];
        let filter = StationFilter {
            query: String::new(),
            favorites_only: true,
        };
        assert_eq!(
            ids(&filter_and_sort(&stations, &filter, &favs(&["A"]))),
            vec!["A"]
        );
        assert!(filter_and_sort(&stations, &filter, &[]).is_empty());
    }

    #[test]
    fn unknown_favorites_reported() {
        let stations = vec![station("A", "Union Sq")];
        assert_eq!(
            unknown_favorites(&stations, &favs(&["A", "Z"])),
            vec!["Z".to_string()]
        );
    }

    #[test]
    fn visible_count_pages() {
        assert_eq!(visible_count(None, 100), 12);
        assert_eq!(visible_count(Some(24), 100), 24);
        assert_eq!(visible_count(Some(13), 100), 24);
        assert_eq!(visible_count(Some(0), 100), 12);
        assert_eq!(visible_count(Some(48), 30), 30);
        assert_eq!(visible_count(None, 5), 5);
    }

    proptest! {
        /// Favorites come first and each side keeps its input order.
        #[test]
        fn stable_partition(
            flags in prop::collection::vec(any::<bool>(), 0..20),
        ) {
            let stations: Vec<Station> = (0..flags.len())
                .map(|i| station(&i.to_string(), &format!("Station {i}")))
                .collect();
            let favorites: Vec<String> = flags
                .iter()
                .enumerate()
                .filter(|(_, f)| **f)
                .map(|(i, _)| i.to_string())
                .collect();

            let result = filter_and_sort(&stations, &StationFilter::default(), &favorites);
            let order: Vec<usize> = result.iter().map(|s| s.id.parse().unwrap()).collect();

            let expected: Vec<usize> = (0..flags.len())
                .filter(|&i| flags[i])
                .chain((0..flags.len()).filter(|&i| !flags[i]))
                .collect();
            prop_assert_eq!(order, expected);
        }
    }
}
