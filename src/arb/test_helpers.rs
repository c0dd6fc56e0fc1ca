#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::rc::Rc;

use super::asset::AssetId;
use super::cycle::Cycle;
use super::pool::{ExchangePrimitive, Pool, PoolRef};
use super::swap::Swap;

pub fn assets(symbols: &[&str]) -> Vec<AssetId> {
    symbols.iter().map(|symbol| AssetId::from(*symbol)).collect()
}

pub fn constant_product_pool(name: &str, symbols: &[&str], amounts: &[f64], fee: f64) -> PoolRef {
    Rc::new(
        Pool::new(
            name,
            assets(symbols),
            amounts.to_vec(),
            ExchangePrimitive::constant_product("cp", fee).unwrap(),
        )
        .unwrap(),
    )
}

pub fn constant_sum_pool(name: &str, symbols: &[&str], amounts: &[f64], fee: f64) -> PoolRef {
    Rc::new(
        Pool::new(
            name,
            assets(symbols),
            amounts.to_vec(),
            ExchangePrimitive::constant_sum("cs", fee).unwrap(),
        )
        .unwrap(),
    )
}

pub fn fixed_pool(name: &str, asset0: &str, asset1: &str, rate: f64) -> PoolRef {
    Rc::new(Pool::fixed_rate(name, asset0.into(), asset1.into(), rate).unwrap())
}

pub fn swap(edge: usize, pool: &PoolRef, token_in: &str, token_out: &str) -> Swap {
    Swap::new(edge, Rc::clone(pool), &token_in.into(), &token_out.into()).unwrap()
}

/// A -> B -> C -> A inside one constant sum pool
pub fn stable_triangle(fee: f64) -> Cycle {
    let pool = constant_sum_pool("S", &["A", "B", "C"], &[100.0, 200.0, 300.0], fee);
    Cycle::new(vec![
        swap(0, &pool, "A", "B"),
        swap(2, &pool, "B", "C"),
        swap(1, &pool, "C", "A"),
    ])
    .unwrap()
}

/// A -> C -> B -> A through fixed rates A/B 1.2, A/C 1.11, B/C 0.57 (returns ~1.62)
pub fn fixed_triangle() -> Cycle {
    let a_b = fixed_pool("AB", "A", "B", 1.2);
    let a_c = fixed_pool("AC", "A", "C", 1.11);
    let b_c = fixed_pool("BC", "B", "C", 0.57);
    Cycle::new(vec![
        swap(1, &a_c, "A", "C"),
        swap(2, &b_c, "C", "B"),
        swap(0, &a_b, "B", "A"),
    ])
    .unwrap()
}

/// A profitable A -> B -> C -> A loop through three constant product pools with a 0.3% fee.
/// Best investment is about 82 A for about 33 A of profit.
pub fn amm_triangle() -> (Vec<PoolRef>, Cycle) {
    let a_b = constant_product_pool("AB", &["A", "B"], &[1_000.0, 2_000.0], 0.3);
    let b_c = constant_product_pool("BC", &["B", "C"], &[1_000.0, 1_000.0], 0.3);
    let c_a = constant_product_pool("CA", &["C", "A"], &[1_000.0, 1_000.0], 0.3);
    let cycle = Cycle::new(vec![
        swap(0, &a_b, "A", "B"),
        swap(1, &b_c, "B", "C"),
        swap(2, &c_a, "C", "A"),
    ])
    .unwrap();
    (vec![a_b, b_c, c_a], cycle)
}

/// Two constant product pools (one of them holding four assets) and a fixed A/B rate, all
/// constant product pools charging 5%.
pub fn three_pool_market() -> Vec<Pool> {
    vec![
        Pool::new(
            "pool1",
            assets(&["A", "B", "C"]),
            vec![500.0, 400.0, 200.0],
            ExchangePrimitive::constant_product("cp", 5.0).unwrap(),
        )
        .unwrap(),
        Pool::new(
            "pool2",
            assets(&["A", "B", "C", "D"]),
            vec![500.0, 400.0, 300.0, 200.0],
            ExchangePrimitive::constant_product("cp", 5.0).unwrap(),
        )
        .unwrap(),
        Pool::fixed_rate("pool3", "A".into(), "B".into(), 1.5).unwrap(),
    ]
}
