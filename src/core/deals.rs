use crate::domain::model::{Offer, Route};
use std::collections::{BTreeMap, HashMap};

/// 篩選低於基準價的報價，每個目的地只保留最便宜的一筆，依價格由低到高排序。
///
/// `threshold` 為乘數：1.0 表示不高於平均，0.8 表示至少低 20%。
pub fn select_deals(
    offers: &[Offer],
    baselines: &BTreeMap<Route, f64>,
    threshold: f64,
    max_price: Option<f64>,
) -> Vec<Offer> {
    let mut best: Vec<Offer> = Vec::new();
    let mut index_by_destination: HashMap<(&str, Option<&str>), usize> = HashMap::new();

    for offer in offers {
        let Some(baseline) = baselines.get(&offer.route()) else {
            continue;
        };
        if offer.price > baseline * threshold {
            continue;
        }
        if max_price.is_some_and(|max| offer.price > max) {
            continue;
        }

        let key = (offer.destination.as_str(), offer.destination_city.as_deref());
        match index_by_destination.get(&key) {
            // 同價時保留先出現的
            Some(&i) => {
                if offer.price < best[i].price {
                    best[i] = offer.clone();
                }
            }
            None => {
                index_by_destination.insert(key, best.len());
                best.push(offer.clone());
            }
        }
    }

    best.sort_by(|a, b| a.price.total_cmp(&b.price));
    best
}
