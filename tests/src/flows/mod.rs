//! Integration flows.

#[cfg(test)]
mod block_detail;
#[cfg(test)]
mod lifecycle;
#[cfg(test)]
mod live_list;
#[cfg(test)]
mod network_switch;
