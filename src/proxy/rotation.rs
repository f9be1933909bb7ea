//! Round-robin proxy assignment
//!
//! Assignment is keyed on account load order rather than on a running
//! counter, so account `i` always lands on `proxies[i % k]`.

use tracing::info;

use crate::models::{Account, Proxy};

/// Selects proxies in round-robin order over a fixed pool
pub struct RoundRobinSelector<'a> {
    proxies: &'a [Proxy],
}

impl<'a> RoundRobinSelector<'a> {
    pub fn new(proxies: &'a [Proxy]) -> Self {
        Self { proxies }
    }

    /// Proxy for the account at `index`, `None` when the pool is empty
    pub fn select_for(&self, index: usize) -> Option<&'a Proxy> {
        if self.proxies.is_empty() {
            return None;
        }
        self.proxies.get(index % self.proxies.len())
    }

    /// Give every account that has no proxy yet its round-robin slot
    ///
    /// Returns how many accounts received a proxy.
    pub fn assign_missing(&self, accounts: &mut [Account]) -> usize {
        let mut assigned = 0;
        for account in accounts.iter_mut().filter(|a| a.proxy.is_none()) {
            if let Some(proxy) = self.select_for(account.index) {
                info!("{} -> {}", account.label(), proxy.label());
                account.assign_proxy(proxy.clone());
                assigned += 1;
            }
        }
        assigned
    }

    pub fn available_count(&self) -> usize {
        self.proxies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_proxy(port: u16, ip: &str) -> Proxy {
        Proxy::parse(&format!("127.0.0.1:{}", port))
            .unwrap()
            .with_public_ip(ip)
    }

    #[test]
    fn test_round_robin_empty() {
        let selector = RoundRobinSelector::new(&[]);
        assert!(selector.select_for(0).is_none());

        let mut accounts = vec![Account::new(0, "a")];
        assert_eq!(selector.assign_missing(&mut accounts), 0);
        assert!(accounts[0].proxy.is_none());
    }

    #[test]
    fn test_round_robin_index_mod_pool() {
        let proxies = vec![
            create_test_proxy(8081, "10.0.0.1"),
            create_test_proxy(8082, "10.0.0.2"),
            create_test_proxy(8083, "10.0.0.3"),
        ];
        let selector = RoundRobinSelector::new(&proxies);

        for i in 0..7 {
            assert_eq!(selector.select_for(i).unwrap(), &proxies[i % 3]);
        }
    }

    #[test]
    fn test_assign_missing_keeps_existing_assignments() {
        let proxies = vec![
            create_test_proxy(8081, "10.0.0.1"),
            create_test_proxy(8082, "10.0.0.2"),
        ];
        let selector = RoundRobinSelector::new(&proxies);

        let mut accounts: Vec<Account> = (0..5).map(|i| Account::new(i, "tok")).collect();
        accounts[3].assign_proxy(proxies[0].clone());

        assert_eq!(selector.assign_missing(&mut accounts), 4);

        let ips: Vec<_> = accounts
            .iter()
            .map(|a| a.proxy.as_ref().unwrap().label())
            .collect();
        assert_eq!(
            ips,
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.1", "10.0.0.1", "10.0.0.1"]
        );
        assert!(accounts.iter().all(|a| a.proxy_enabled));
    }
}
