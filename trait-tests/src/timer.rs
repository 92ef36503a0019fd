use proc_macro2::TokenStream;
use quote::quote;

pub fn expand_timer_tests(factory: TokenStream) -> TokenStream {
    quote! {
        #[cfg(test)]
        mod timer_conformance {
            use super::*;
            use std::{sync::{Arc, Mutex}, time::Duration};
            use futures::join;
            use settle_traits::Timer;

            #[tokio::test]
            async fn zero_delay_resolves() {
                let timer = #factory;
                let start = timer.now();
                timer.delay(Duration::ZERO).await;
                assert!(timer.now() >= start);
            }

            #[tokio::test]
            async fn delay_elapses_at_least_requested() {
                let delay = Duration::from_millis(50);
                let timer = #factory;
                let start = timer.now();
                timer.delay(delay).await;
                assert!(timer.now() - start >= delay, "delay resolved early");
            }

            #[tokio::test]
            async fn concurrent_delays_resolve_in_deadline_order() {
                let timer = #factory;
                let order = Arc::new(Mutex::new(vec![]));
                let late = {
                    let timer = timer.clone();
                    let order = order.clone();
                    async move {
                        timer.delay(Duration::from_millis(90)).await;
                        order.lock().unwrap().push("late");
                    }
                };
                let early = {
                    let timer = timer.clone();
                    let order = order.clone();
                    async move {
                        timer.delay(Duration::from_millis(30)).await;
                        order.lock().unwrap().push("early");
                    }
                };
                join!(late, early);
                assert_eq!(*order.lock().unwrap(), vec!["early", "late"]);
            }

            #[tokio::test]
            async fn clones_share_the_clock() {
                let delay = Duration::from_millis(20);
                let timer = #factory;
                let other = timer.clone();
                let start = timer.now();
                other.delay(delay).await;
                assert!(timer.now() - start >= delay);
            }
        }
    }
}
