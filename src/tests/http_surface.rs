// Full router on an ephemeral port: bearer auth, GET-only credential routes,
// raw-text bodies, 500 on upstream failure, unauthenticated metrics.

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use axum::http::StatusCode;
    use jsonwebtoken::Algorithm;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

    use crate::auth::jwt::Authenticator;
    use crate::cache::credential_store::CredentialStore;
    use crate::config::settings::MetricsConfig;
    use crate::resolver::CredentialResolver;
    use crate::server::server::{router, AppState};
    use crate::tests::common::{
        build_reqwest_client, invalid_access_token, mint_jwt, provider_error, spawn_axum,
        test_auth_config, valid_bearer, JoinHandle, ScriptedIssuer,
    };

    async fn serve(issuer: ScriptedIssuer) -> (JoinHandle<()>, String, AppState<ScriptedIssuer>) {
        let state = AppState::new(
            CredentialResolver::new(CredentialStore::new(), issuer),
            Authenticator::new(&test_auth_config()),
        );
        let metrics_config = MetricsConfig {
            path: "/metrics".to_owned(),
            is_enabled: true,
        };
        let app = router(state.clone(), &metrics_config).await;
        let (handle, addr) = spawn_axum(app).await;
        (handle, format!("http://{}", addr), state)
    }

    #[tokio::test]
    async fn access_token_returns_raw_text() -> Result<()> {
        let (handle, base, state) = serve(ScriptedIssuer::new().with_access_token("token1", 7200)).await;
        let client = build_reqwest_client();

        for _ in 0..2 {
            let res = client
                .get(format!("{}/access_token", base))
                .header(AUTHORIZATION, valid_bearer())
                .send()
                .await?;
            assert_eq!(res.status(), StatusCode::OK);
            assert!(res.headers()[CONTENT_TYPE].to_str()?.starts_with("text/plain"));
            assert_eq!(res.text().await?, "token1");
        }
        assert_eq!(state.resolver.issuer().access_token_calls(), 1);

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn rotate_token_parameter_forces_refresh() -> Result<()> {
        let (handle, base, state) = serve(
            ScriptedIssuer::new()
                .with_access_token("token1", 7200)
                .with_access_token("token2", 7200),
        )
        .await;
        let client = build_reqwest_client();
        let get = |query: &'static str| {
            client
                .get(format!("{}/access_token{}", base, query))
                .header(AUTHORIZATION, valid_bearer())
                .send()
        };

        assert_eq!(get("").await?.text().await?, "token1");
        assert_eq!(get("?rotate_token=").await?.text().await?, "token1");
        assert_eq!(get("?rotate_token=stale").await?.text().await?, "token1");
        assert_eq!(get("?rotate_token=token1").await?.text().await?, "token2");
        assert_eq!(state.resolver.issuer().access_token_calls(), 2);

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn ticket_endpoint_recovers_and_serves_from_cache() -> Result<()> {
        let (handle, base, state) = serve(
            ScriptedIssuer::new()
                .with_access_token("token1", 7200)
                .with_access_token("token2", 7200)
                .with_ticket_error(invalid_access_token())
                .with_ticket("ticket1", 7200),
        )
        .await;
        let client = build_reqwest_client();

        let res = client
            .get(format!("{}/ticket?type=jsapi", base))
            .header(AUTHORIZATION, valid_bearer())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await?, "ticket1");

        let res = client
            .get(format!("{}/ticket?type=jsapi&rotate_ticket=ticket2", base))
            .header(AUTHORIZATION, valid_bearer())
            .send()
            .await?;
        assert_eq!(res.text().await?, "ticket1");
        assert_eq!(state.resolver.issuer().ticket_calls(), 2);
        assert_eq!(state.resolver.issuer().ticket_tokens(), vec!["token1", "token2"]);

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn repeated_query_keys_use_first_value() -> Result<()> {
        let (handle, base, state) = serve(
            ScriptedIssuer::new()
                .with_access_token("token1", 7200)
                .with_ticket("ticket1", 7200),
        )
        .await;

        let res = build_reqwest_client()
            .get(format!("{}/ticket?type=jsapi&type=wx_card&rotate_ticket=a&rotate_ticket=b", base))
            .header(AUTHORIZATION, valid_bearer())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await?, "ticket1");
        assert_eq!(state.resolver.store().get("ticket_jsapi").await.as_deref(), Some("ticket1"));

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn upstream_failure_is_500_with_error_text() -> Result<()> {
        let (handle, base, _state) = serve(
            ScriptedIssuer::new()
                .with_access_token("token1", 7200)
                .with_ticket_error(provider_error(40097, "invalid args")),
        )
        .await;

        let res = build_reqwest_client()
            .get(format!("{}/ticket?type=unknown", base))
            .header(AUTHORIZATION, valid_bearer())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.text().await?, "fetch ticket fail, code: 40097, message: invalid args");

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn requests_without_valid_bearer_are_401() -> Result<()> {
        let (handle, base, state) = serve(ScriptedIssuer::new().with_access_token("token1", 7200)).await;
        let client = build_reqwest_client();
        let url = format!("{}/access_token", base);
        let token = mint_jwt(
            Algorithm::HS256,
            Some("key1"),
            "secret1",
            "wechat-token-hub",
            Some(chrono::Utc::now().timestamp() + 300),
        );

        let res = client.get(&url).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.text().await?, "Authorization header missing");

        let res = client.get(&url).header(AUTHORIZATION, format!("Other {}", token)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.text().await?, "Invalid authorization header");

        let res = client.get(&url).header(AUTHORIZATION, "Bearer invalid_token").send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let wrong_audience = mint_jwt(
            Algorithm::HS256,
            Some("key1"),
            "secret1",
            "other service",
            Some(chrono::Utc::now().timestamp() + 300),
        );
        let res = client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", wrong_audience))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(state.resolver.issuer().access_token_calls(), 0);
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn credential_routes_only_accept_get() -> Result<()> {
        let (handle, base, state) = serve(ScriptedIssuer::new()).await;
        let client = build_reqwest_client();

        let res = client
            .post(format!("{}/access_token", base))
            .header(AUTHORIZATION, valid_bearer())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        let res = client
            .delete(format!("{}/ticket?type=jsapi", base))
            .header(AUTHORIZATION, valid_bearer())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(state.resolver.issuer().access_token_calls(), 0);

        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn metrics_are_served_without_auth() -> Result<()> {
        let (handle, base, _state) = serve(ScriptedIssuer::new().with_access_token("token1", 7200)).await;
        let client = build_reqwest_client();

        client
            .get(format!("{}/access_token", base))
            .header(AUTHORIZATION, valid_bearer())
            .send()
            .await?;

        let res = client.get(format!("{}/metrics", base)).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.text().await?;
        assert!(body.contains("tokenhub_http_requests_total"), "{}", body);
        assert!(body.contains("tokenhub_cache_lookups_total"), "{}", body);

        let res = client.get(format!("{}/nope", base)).send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        handle.abort();
        Ok(())
    }
}
