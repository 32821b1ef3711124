use log::info;
use std::collections::{ BTreeSet, HashMap, HashSet };

use crate::models::{ ChatId, ProductId };

pub type ChatProductMap = HashMap<ChatId, ProductId>;

pub fn filter_relevant(
    chat_to_product: &ChatProductMap,
    target_products: &HashSet<ProductId>
) -> BTreeSet<ChatId> {
    let relevant: BTreeSet<ChatId> = chat_to_product
        .iter()
        .filter(|(_, product_id)| target_products.contains(product_id))
        .map(|(chat_id, _)| chat_id.clone())
        .collect();
    info!("Found {} unique chat IDs associated with target nmIDs.", relevant.len());
    relevant
}
